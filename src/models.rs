use std::{fmt, str::FromStr};

use base64::{Engine, engine::general_purpose::STANDARD};
use jiff::civil::Date;
use sea_orm::DbErr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    entities::{actor, movie},
    error::CatalogError,
};

/// Row-version token attached to every movie row.
///
/// Regenerated on every successful write. Clients only ever compare it for
/// equality; over the wire it travels as standard base64.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct VersionToken(Vec<u8>);

impl VersionToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().as_bytes().to_vec())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&STANDARD.encode(&self.0))
    }
}

impl FromStr for VersionToken {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CatalogError::invalid("row_version", "missing"));
        }
        STANDARD
            .decode(s)
            .map(Self)
            .map_err(|e| CatalogError::invalid("row_version", e.to_string()))
    }
}

impl Serialize for VersionToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Box-office gross as a fixed-point amount with two fraction digits.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Gross(i64);

impl Gross {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Gross {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Gross {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CatalogError::invalid("gross", reason.to_string());

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal amount such as 1234.50"));
        }
        if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two digits after the decimal point"));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse().unwrap_or(0),
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Serialize for Gross {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Gross {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The editable columns of a movie.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MovieField {
    Title,
    Director,
    ReleaseDate,
    Gross,
    Rating,
    GenreId,
}

impl MovieField {
    pub const ALL: [MovieField; 6] = [
        MovieField::Title,
        MovieField::Director,
        MovieField::ReleaseDate,
        MovieField::Gross,
        MovieField::Rating,
        MovieField::GenreId,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MovieField::Title => "Title",
            MovieField::Director => "Director",
            MovieField::ReleaseDate => "ReleaseDate",
            MovieField::Gross => "Gross",
            MovieField::Rating => "Rating",
            MovieField::GenreId => "GenreID",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MovieField::Title => "Title",
            MovieField::Director => "Director",
            MovieField::ReleaseDate => "Release Date",
            MovieField::Gross => "Gross",
            MovieField::Rating => "Rating",
            MovieField::GenreId => "Genre",
        }
    }
}

impl Serialize for MovieField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieFields {
    pub title: String,
    pub director: String,
    pub release_date: Date,
    pub gross: Gross,
    pub rating: f64,
    pub genre_id: i32,
}

impl MovieFields {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::invalid("title", "is required"));
        }
        if !self.rating.is_finite() {
            return Err(CatalogError::invalid("rating", "must be a finite number"));
        }
        Ok(())
    }

    /// Text form of one field, as reported in conflict payloads.
    pub fn render(&self, field: MovieField) -> String {
        match field {
            MovieField::Title => self.title.clone(),
            MovieField::Director => self.director.clone(),
            MovieField::ReleaseDate => self.release_date.to_string(),
            MovieField::Gross => self.gross.to_string(),
            MovieField::Rating => self.rating.to_string(),
            MovieField::GenreId => self.genre_id.to_string(),
        }
    }

    pub fn differs(&self, other: &MovieFields, field: MovieField) -> bool {
        match field {
            MovieField::Title => self.title != other.title,
            MovieField::Director => self.director != other.director,
            MovieField::ReleaseDate => self.release_date != other.release_date,
            MovieField::Gross => self.gross != other.gross,
            MovieField::Rating => self.rating != other.rating,
            MovieField::GenreId => self.genre_id != other.genre_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Movie {
    pub id: i32,
    #[serde(flatten)]
    pub fields: MovieFields,
    pub row_version: VersionToken,
}

impl TryFrom<movie::Model> for Movie {
    type Error = CatalogError;

    fn try_from(row: movie::Model) -> Result<Self, Self::Error> {
        let release_date = row.release_date.parse::<Date>().map_err(|e| {
            DbErr::Type(format!("movie {} has bad release_date {:?}: {e}", row.id, row.release_date))
        })?;

        Ok(Self {
            id: row.id,
            fields: MovieFields {
                title: row.title,
                director: row.director,
                release_date,
                gross: Gross::from_cents(row.gross_cents),
                rating: row.rating,
                genre_id: row.genre_id,
            },
            row_version: VersionToken::from_bytes(row.row_version),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Actor {
    pub id: i32,
    pub name: String,
    pub birth_date: Date,
}

impl TryFrom<actor::Model> for Actor {
    type Error = CatalogError;

    fn try_from(row: actor::Model) -> Result<Self, Self::Error> {
        let birth_date = row.birth_date.parse::<Date>().map_err(|e| {
            DbErr::Type(format!("actor {} has bad birth_date {:?}: {e}", row.id, row.birth_date))
        })?;
        Ok(Self { id: row.id, name: row.name, birth_date })
    }
}

/// An actor's role in a specific movie.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Character {
    pub id: i32,
    pub movie_id: i32,
    pub actor_id: i32,
    pub actor_name: String,
    pub character: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl MovieFilter {
    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_deref())
    }

    pub fn genre(&self) -> Option<&str> {
        non_empty(self.genre.as_deref())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Raw create/edit form submission. Kept as text so a rejected form can be
/// re-rendered exactly as the user typed it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieForm {
    pub title: String,
    #[serde(default)]
    pub director: String,
    pub release_date: String,
    pub gross: String,
    pub rating: String,
    pub genre_id: String,
    #[serde(default)]
    pub row_version: String,
}

impl MovieForm {
    pub fn parse(&self) -> Result<MovieFields, CatalogError> {
        let release_date = parse_date("release_date", &self.release_date)?;
        let gross = self.gross.parse()?;
        let rating = self
            .rating
            .trim()
            .parse::<f64>()
            .map_err(|e| CatalogError::invalid("rating", e.to_string()))?;
        let genre_id = self
            .genre_id
            .trim()
            .parse()
            .map_err(|_| CatalogError::invalid("genre_id", "choose a genre"))?;

        let fields = MovieFields {
            title: self.title.trim().to_string(),
            director: self.director.trim().to_string(),
            release_date,
            gross,
            rating,
            genre_id,
        };
        fields.validate()?;
        Ok(fields)
    }

    pub fn token(&self) -> Result<VersionToken, CatalogError> {
        self.row_version.parse()
    }

    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            title: movie.fields.title.clone(),
            director: movie.fields.director.clone(),
            release_date: movie.fields.release_date.to_string(),
            gross: movie.fields.gross.to_string(),
            rating: movie.fields.rating.to_string(),
            genre_id: movie.fields.genre_id.to_string(),
            row_version: movie.row_version.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub row_version: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ActorForm {
    pub name: String,
    pub birth_date: String,
}

#[derive(Debug, Deserialize)]
pub struct CharacterForm {
    pub actor_id: i32,
    pub character: String,
}

/// JSON body of `PUT /api/movies/{id}`.
#[derive(Debug, Deserialize)]
pub struct MovieUpdate {
    #[serde(flatten)]
    pub fields: MovieFields,
    pub row_version: VersionToken,
}

/// JSON body of `DELETE /api/movies/{id}`.
#[derive(Debug, Deserialize)]
pub struct MovieDelete {
    pub row_version: VersionToken,
}

pub fn parse_date(field: &'static str, s: &str) -> Result<Date, CatalogError> {
    s.trim().parse().map_err(|e: jiff::Error| CatalogError::invalid(field, e.to_string()))
}
