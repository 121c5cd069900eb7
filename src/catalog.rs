use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::{
    entities::{actor, actor_movie, genre, movie},
    error::CatalogError,
    models::{Actor, Character, Movie, MovieFields, MovieFilter, VersionToken},
    resolver::{self, Conflict, DeleteVerdict, EditVerdict},
};

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    Applied(Movie),
    DeletedConflict,
    ModifiedConflict(Conflict),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyDeleted,
    ModifiedConflict(Conflict),
}

#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_movie(&self, id: i32) -> CatalogResult<Option<Movie>> {
        movie::Entity::find_by_id(id).one(&self.db).await?.map(Movie::try_from).transpose()
    }

    pub async fn get_movie(&self, id: i32) -> CatalogResult<Movie> {
        self.find_movie(id).await?.ok_or_else(|| CatalogError::not_found("movie", id))
    }

    pub async fn list_movies(&self, filter: &MovieFilter) -> CatalogResult<Vec<Movie>> {
        let mut query = movie::Entity::find();
        if let Some(search) = filter.search() {
            query = query.filter(movie::Column::Title.contains(search));
        }
        if let Some(genre) = filter.genre() {
            query = query
                .inner_join(genre::Entity)
                .filter(genre::Column::Name.contains(genre));
        }

        let rows = query
            .order_by_asc(movie::Column::Title)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;

        debug!(search = ?filter.search(), genre = ?filter.genre(), count = rows.len(), "listed movies");
        rows.into_iter().map(Movie::try_from).collect()
    }

    pub async fn create_movie(&self, fields: &MovieFields) -> CatalogResult<Movie> {
        fields.validate()?;
        self.ensure_genre(fields.genre_id).await?;

        let row_version = VersionToken::generate();
        let id = movie::Entity::insert(columns(fields, &row_version))
            .exec(&self.db)
            .await?
            .last_insert_id;
        info!(movie_id = id, title = %fields.title, "created movie");

        Ok(Movie { id, fields: fields.clone(), row_version })
    }

    /// Writes `fields` over movie `id` if the row still carries `token`.
    pub async fn apply_edit(
        &self,
        id: i32,
        fields: &MovieFields,
        token: &VersionToken,
    ) -> CatalogResult<EditOutcome> {
        fields.validate()?;
        let current = self.find_movie(id).await?;
        self.write_edit(id, current.as_ref(), fields, token).await
    }

    /// Decides on the already loaded `current` row, then writes with a
    /// conditional update. The row may have changed since it was loaded.
    pub(crate) async fn write_edit(
        &self,
        id: i32,
        current: Option<&Movie>,
        fields: &MovieFields,
        token: &VersionToken,
    ) -> CatalogResult<EditOutcome> {
        match resolver::resolve_edit(current, fields, token) {
            EditVerdict::DeletedConflict => {
                warn!(movie_id = id, "edit rejected: movie was deleted");
                return Ok(EditOutcome::DeletedConflict);
            },
            EditVerdict::ModifiedConflict(conflict) => {
                warn!(movie_id = id, changed = conflict.changes.len(), "edit rejected: stale row version");
                return Ok(EditOutcome::ModifiedConflict(conflict));
            },
            EditVerdict::Apply => {},
        }

        self.ensure_genre(fields.genre_id).await?;

        let next = VersionToken::generate();
        let result = movie::Entity::update_many()
            .set(columns(fields, &next))
            .filter(movie::Column::Id.eq(id))
            .filter(movie::Column::RowVersion.eq(token.as_bytes().to_vec()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            // Another writer got in between the load and the update.
            let outcome = match self.find_movie(id).await? {
                None => EditOutcome::DeletedConflict,
                Some(row) => EditOutcome::ModifiedConflict(Conflict::against(&row, fields)),
            };
            warn!(movie_id = id, "edit lost the race to a concurrent writer");
            return Ok(outcome);
        }

        info!(movie_id = id, "applied edit");
        Ok(EditOutcome::Applied(Movie { id, fields: fields.clone(), row_version: next }))
    }

    /// Removes movie `id` and its cast entries if the row still carries `token`.
    pub async fn apply_delete(&self, id: i32, token: &VersionToken) -> CatalogResult<DeleteOutcome> {
        let current = self.find_movie(id).await?;
        self.write_delete(id, current.as_ref(), token).await
    }

    pub(crate) async fn write_delete(
        &self,
        id: i32,
        current: Option<&Movie>,
        token: &VersionToken,
    ) -> CatalogResult<DeleteOutcome> {
        match resolver::resolve_delete(current, token) {
            DeleteVerdict::AlreadyDeleted => {
                debug!(movie_id = id, "delete: movie already gone");
                return Ok(DeleteOutcome::AlreadyDeleted);
            },
            DeleteVerdict::ModifiedConflict(conflict) => {
                warn!(movie_id = id, "delete rejected: stale row version");
                return Ok(DeleteOutcome::ModifiedConflict(conflict));
            },
            DeleteVerdict::Remove => {},
        }

        let txn = self.db.begin().await?;

        let removed = movie::Entity::delete_many()
            .filter(movie::Column::Id.eq(id))
            .filter(movie::Column::RowVersion.eq(token.as_bytes().to_vec()))
            .exec(&txn)
            .await?;

        if removed.rows_affected == 0 {
            txn.rollback().await?;
            let outcome = match self.find_movie(id).await? {
                None => DeleteOutcome::AlreadyDeleted,
                Some(row) => DeleteOutcome::ModifiedConflict(Conflict::snapshot(&row)),
            };
            warn!(movie_id = id, "delete lost the race to a concurrent writer");
            return Ok(outcome);
        }

        let characters = actor_movie::Entity::delete_many()
            .filter(actor_movie::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(movie_id = id, characters = characters.rows_affected, "deleted movie");
        Ok(DeleteOutcome::Deleted)
    }

    pub async fn load_genre(&self, movie: &Movie) -> CatalogResult<genre::Model> {
        genre::Entity::find_by_id(movie.fields.genre_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("genre", movie.fields.genre_id))
    }

    pub async fn load_characters(&self, movie: &Movie) -> CatalogResult<Vec<Character>> {
        let rows = actor_movie::Entity::find()
            .filter(actor_movie::Column::MovieId.eq(movie.id))
            .find_also_related(actor::Entity)
            .order_by_asc(actor_movie::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(role, actor)| Character {
                id: role.id,
                movie_id: role.movie_id,
                actor_id: role.actor_id,
                actor_name: actor.map(|a| a.name).unwrap_or_default(),
                character: role.character,
            })
            .collect())
    }

    pub async fn genres(&self) -> CatalogResult<Vec<genre::Model>> {
        Ok(genre::Entity::find().order_by_asc(genre::Column::Name).all(&self.db).await?)
    }

    pub async fn genre_movie_count(&self, genre: &genre::Model) -> CatalogResult<u64> {
        Ok(genre.find_related(movie::Entity).count(&self.db).await?)
    }

    pub async fn create_genre(&self, name: &str, description: &str) -> CatalogResult<genre::Model> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::invalid("name", "is required"));
        }
        let description = description.trim();

        let model = genre::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            description: Set((!description.is_empty()).then(|| description.to_string())),
        };
        let genre = model.insert(&self.db).await?;
        info!(genre_id = genre.id, name = %genre.name, "created genre");
        Ok(genre)
    }

    pub async fn actors(&self) -> CatalogResult<Vec<Actor>> {
        actor::Entity::find()
            .order_by_asc(actor::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Actor::try_from)
            .collect()
    }

    pub async fn create_actor(&self, name: &str, birth_date: jiff::civil::Date) -> CatalogResult<Actor> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::invalid("name", "is required"));
        }

        let model = actor::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            birth_date: Set(birth_date.to_string()),
        };
        let actor = Actor::try_from(model.insert(&self.db).await?)?;
        info!(actor_id = actor.id, name = %actor.name, "created actor");
        Ok(actor)
    }

    pub async fn add_character(
        &self,
        movie_id: i32,
        actor_id: i32,
        character: &str,
    ) -> CatalogResult<Character> {
        let character = character.trim();
        if character.is_empty() {
            return Err(CatalogError::invalid("character", "is required"));
        }

        self.get_movie(movie_id).await?;
        let actor = actor::Entity::find_by_id(actor_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("actor", actor_id))?;

        let model = actor_movie::ActiveModel {
            id: NotSet,
            actor_id: Set(actor_id),
            movie_id: Set(movie_id),
            character: Set(character.to_string()),
        };
        let role = model.insert(&self.db).await?;
        debug!(movie_id, actor_id, character = %role.character, "added character");

        Ok(Character {
            id: role.id,
            movie_id,
            actor_id,
            actor_name: actor.name,
            character: role.character,
        })
    }

    async fn ensure_genre(&self, genre_id: i32) -> CatalogResult<()> {
        let exists = genre::Entity::find_by_id(genre_id).one(&self.db).await?.is_some();
        if !exists {
            return Err(CatalogError::invalid("genre_id", format!("genre {genre_id} does not exist")));
        }
        Ok(())
    }
}

fn columns(fields: &MovieFields, row_version: &VersionToken) -> movie::ActiveModel {
    movie::ActiveModel {
        id: NotSet,
        title: Set(fields.title.clone()),
        director: Set(fields.director.clone()),
        release_date: Set(fields.release_date.to_string()),
        gross_cents: Set(fields.gross.cents()),
        rating: Set(fields.rating),
        genre_id: Set(fields.genre_id),
        row_version: Set(row_version.as_bytes().to_vec()),
    }
}
