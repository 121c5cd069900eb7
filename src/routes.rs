use std::sync::Arc;

use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::{
    AppState,
    catalog::{Catalog, DeleteOutcome, EditOutcome},
    entities::genre,
    error::{AppResult, CatalogError},
    models::{
        ActorForm, CharacterForm, DeleteForm, GenreForm, MovieFilter, MovieForm, VersionToken,
        parse_date,
    },
    templates::{self, FormMode, Notice},
};

pub async fn index() -> Redirect {
    Redirect::to("/movies")
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<MovieFilter>,
) -> AppResult<Html<String>> {
    let movies = state.catalog.list_movies(&filter).await?;
    let genres = state.catalog.genres().await?;
    Ok(Html(templates::movie_list_page(&movies, &genres, &filter)))
}

pub async fn show_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let movie = state.catalog.get_movie(id).await?;
    let genre = state.catalog.load_genre(&movie).await?;
    let characters = state.catalog.load_characters(&movie).await?;
    let actors = state.catalog.actors().await?;
    Ok(Html(templates::movie_details_page(&movie, &genre, &characters, &actors)))
}

pub async fn new_movie(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let genres = state.catalog.genres().await?;
    Ok(Html(templates::movie_form_page(
        FormMode::Create,
        &MovieForm::default(),
        &genres,
        Notice::None,
    )))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MovieForm>,
) -> AppResult<Response> {
    let created = match form.parse() {
        Ok(fields) => state.catalog.create_movie(&fields).await,
        Err(err) => Err(err),
    };

    match created {
        Ok(_) => Ok(Redirect::to("/movies").into_response()),
        Err(err @ CatalogError::Invalid { .. }) => {
            let genres = state.catalog.genres().await?;
            let message = err.to_string();
            Ok(form_response(
                StatusCode::BAD_REQUEST,
                FormMode::Create,
                &form,
                &genres,
                Notice::Invalid(&message),
            ))
        },
        Err(err) => Err(err.into()),
    }
}

pub async fn edit_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let movie = state.catalog.get_movie(id).await?;
    let genres = state.catalog.genres().await?;
    Ok(Html(templates::movie_form_page(
        FormMode::Edit(id),
        &MovieForm::from_movie(&movie),
        &genres,
        Notice::None,
    )))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Form(form): Form<MovieForm>,
) -> AppResult<Response> {
    let attempt = match form.parse().and_then(|fields| Ok((fields, form.token()?))) {
        Ok((fields, token)) => state.catalog.apply_edit(id, &fields, &token).await,
        Err(err) => Err(err),
    };

    let mode = FormMode::Edit(id);

    match attempt {
        Ok(EditOutcome::Applied(movie)) => {
            debug!(movie_id = movie.id, "edit saved");
            Ok(Redirect::to("/movies").into_response())
        },
        Ok(EditOutcome::ModifiedConflict(conflict)) => {
            let genres = state.catalog.genres().await?;
            Ok(form_response(StatusCode::CONFLICT, mode, &form, &genres, Notice::Modified(&conflict)))
        },
        Ok(EditOutcome::DeletedConflict) => {
            let genres = state.catalog.genres().await?;
            Ok(form_response(StatusCode::CONFLICT, mode, &form, &genres, Notice::Deleted))
        },
        Err(err @ CatalogError::Invalid { .. }) => {
            let genres = state.catalog.genres().await?;
            let message = err.to_string();
            Ok(form_response(StatusCode::BAD_REQUEST, mode, &form, &genres, Notice::Invalid(&message)))
        },
        Err(err) => Err(err.into()),
    }
}

pub async fn confirm_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let movie = state.catalog.get_movie(id).await?;
    let genre = state.catalog.load_genre(&movie).await?;
    Ok(Html(templates::delete_page(&movie, &genre.name, None)))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Form(form): Form<DeleteForm>,
) -> AppResult<Response> {
    let token: VersionToken = form.row_version.parse()?;

    match state.catalog.apply_delete(id, &token).await? {
        DeleteOutcome::Deleted | DeleteOutcome::AlreadyDeleted => {
            Ok(Redirect::to("/movies").into_response())
        },
        DeleteOutcome::ModifiedConflict(conflict) => {
            let genre = state.catalog.load_genre(&conflict.current).await?;
            let body = templates::delete_page(&conflict.current, &genre.name, Some(&conflict));
            Ok((StatusCode::CONFLICT, Html(body)).into_response())
        },
    }
}

pub async fn add_character(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Form(form): Form<CharacterForm>,
) -> AppResult<Redirect> {
    state.catalog.add_character(id, form.actor_id, &form.character).await?;
    Ok(Redirect::to(&format!("/movies/{id}")))
}

pub async fn genres(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let genres = genres_with_counts(&state.catalog).await?;
    Ok(Html(templates::genres_page(&genres, None)))
}

pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    Form(form): Form<GenreForm>,
) -> AppResult<Response> {
    match state.catalog.create_genre(&form.name, &form.description).await {
        Ok(_) => Ok(Redirect::to("/genres").into_response()),
        Err(err @ CatalogError::Invalid { .. }) => {
            let genres = genres_with_counts(&state.catalog).await?;
            let body = templates::genres_page(&genres, Some(&err.to_string()));
            Ok((StatusCode::BAD_REQUEST, Html(body)).into_response())
        },
        Err(err) => Err(err.into()),
    }
}

pub async fn actors(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let actors = state.catalog.actors().await?;
    Ok(Html(templates::actors_page(&actors, None)))
}

pub async fn create_actor(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ActorForm>,
) -> AppResult<Response> {
    let created = match parse_date("birth_date", &form.birth_date) {
        Ok(birth_date) => state.catalog.create_actor(&form.name, birth_date).await,
        Err(err) => Err(err),
    };

    match created {
        Ok(_) => Ok(Redirect::to("/actors").into_response()),
        Err(err @ CatalogError::Invalid { .. }) => {
            let actors = state.catalog.actors().await?;
            let body = templates::actors_page(&actors, Some(&err.to_string()));
            Ok((StatusCode::BAD_REQUEST, Html(body)).into_response())
        },
        Err(err) => Err(err.into()),
    }
}

async fn genres_with_counts(catalog: &Catalog) -> AppResult<Vec<(genre::Model, u64)>> {
    let mut out = Vec::new();
    for genre in catalog.genres().await? {
        let count = catalog.genre_movie_count(&genre).await?;
        out.push((genre, count));
    }
    Ok(out)
}

fn form_response(
    status: StatusCode,
    mode: FormMode,
    form: &MovieForm,
    genres: &[genre::Model],
    notice: Notice<'_>,
) -> Response {
    (status, Html(templates::movie_form_page(mode, form, genres, notice))).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
    };
    use jiff::civil::date;
    use tower::ServiceExt;

    use super::*;
    use crate::models::{Gross, Movie, MovieFields};

    fn encode(pairs: &[(&str, &str)]) -> String {
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    async fn send(app: &Router, method: &str, uri: &str, form: Option<String>) -> (StatusCode, String) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match form {
            Some(form) => {
                req = req.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form)
            },
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn movie_form(movie: &Movie, title: &str, row_version: &str) -> String {
        let gross = movie.fields.gross.to_string();
        let rating = movie.fields.rating.to_string();
        let genre_id = movie.fields.genre_id.to_string();
        let release_date = movie.fields.release_date.to_string();
        encode(&[
            ("title", title),
            ("director", movie.fields.director.as_str()),
            ("release_date", release_date.as_str()),
            ("gross", gross.as_str()),
            ("rating", rating.as_str()),
            ("genre_id", genre_id.as_str()),
            ("row_version", row_version),
        ])
    }

    async fn seeded(catalog: &Catalog) -> Movie {
        let genre = catalog.create_genre("Thriller", "").await.unwrap();
        catalog
            .create_movie(&MovieFields {
                title: "A".to_string(),
                director: "Kathryn Bigelow".to_string(),
                release_date: date(2008, 9, 4),
                gross: Gross::from_cents(4_900_000_000),
                rating: 7.5,
                genre_id: genre.id,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_form_redirects_and_lists_movie() {
        let (_dir, app, catalog) = crate::test_app().await;
        let genre = catalog.create_genre("Documentary", "").await.unwrap();
        let genre_id = genre.id.to_string();

        let form = encode(&[
            ("title", "Man on Wire"),
            ("director", "James Marsh"),
            ("release_date", "2008-07-25"),
            ("gross", "5000000"),
            ("rating", "7.7"),
            ("genre_id", genre_id.as_str()),
        ]);
        let (status, _) = send(&app, "POST", "/movies", Some(form)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let (status, body) = send(&app, "GET", "/movies?search=Wire", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Man on Wire"));
        assert!(body.contains("$5000000.00"));
    }

    #[tokio::test]
    async fn create_form_with_bad_gross_is_rerendered() {
        let (_dir, app, _catalog) = crate::test_app().await;

        let form = encode(&[
            ("title", "Bad Money"),
            ("release_date", "2020-01-01"),
            ("gross", "12.345"),
            ("rating", "5"),
            ("genre_id", "1"),
        ]);
        let (status, body) = send(&app, "POST", "/movies", Some(form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid gross"));
        assert!(body.contains("Bad Money"));
    }

    #[tokio::test]
    async fn stale_edit_shows_current_values() {
        let (_dir, app, catalog) = crate::test_app().await;
        let movie = seeded(&catalog).await;
        let original = movie.row_version.to_string();

        let (status, _) =
            send(&app, "POST", &format!("/movies/{}/edit", movie.id), Some(movie_form(&movie, "B", &original)))
                .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let current = catalog.get_movie(movie.id).await.unwrap();

        let (status, body) =
            send(&app, "POST", &format!("/movies/{}/edit", movie.id), Some(movie_form(&movie, "C", &original)))
                .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("Current value: B"));
        assert!(body.contains(&current.row_version.to_string()));
        assert_eq!(catalog.get_movie(movie.id).await.unwrap().fields.title, "B");
    }

    #[tokio::test]
    async fn edit_of_deleted_movie_says_so() {
        let (_dir, app, catalog) = crate::test_app().await;
        let movie = seeded(&catalog).await;
        let token = movie.row_version.to_string();

        catalog.apply_delete(movie.id, &movie.row_version).await.unwrap();

        let (status, body) =
            send(&app, "POST", &format!("/movies/{}/edit", movie.id), Some(movie_form(&movie, "B", &token)))
                .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("deleted by another user"));
    }

    #[tokio::test]
    async fn invalid_edit_is_rerendered_with_genres() {
        let (_dir, app, catalog) = crate::test_app().await;
        let movie = seeded(&catalog).await;
        let token = movie.row_version.to_string();
        let uri = format!("/movies/{}/edit", movie.id);

        let (status, body) = send(&app, "POST", &uri, Some(movie_form(&movie, "", &token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid title"));
        assert!(body.contains("Thriller"));
        assert_eq!(catalog.get_movie(movie.id).await.unwrap(), movie);

        let (status, _) = send(&app, "POST", &uri, Some(movie_form(&movie, "B", &token))).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn delete_then_details_is_not_found() {
        let (_dir, app, catalog) = crate::test_app().await;
        let movie = seeded(&catalog).await;
        let token = movie.row_version.to_string();
        let form = encode(&[("row_version", token.as_str())]);

        let (status, _) =
            send(&app, "POST", &format!("/movies/{}/delete", movie.id), Some(form.clone())).await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let (status, _) = send(&app, "GET", &format!("/movies/{}", movie.id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", &format!("/movies/{}/delete", movie.id), Some(form)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn stale_delete_is_refused() {
        let (_dir, app, catalog) = crate::test_app().await;
        let movie = seeded(&catalog).await;

        let mut edit = movie.fields.clone();
        edit.director = "Someone Else".to_string();
        catalog.apply_edit(movie.id, &edit, &movie.row_version).await.unwrap();

        let token = movie.row_version.to_string();
        let form = encode(&[("row_version", token.as_str())]);
        let (status, body) =
            send(&app, "POST", &format!("/movies/{}/delete", movie.id), Some(form)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("modified by another user"));
        assert!(body.contains("Someone Else"));
        assert!(catalog.find_movie(movie.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn details_show_cast() {
        let (_dir, app, catalog) = crate::test_app().await;
        let movie = seeded(&catalog).await;
        let actor = catalog.create_actor("Jeremy Renner", date(1971, 1, 7)).await.unwrap();

        let actor_id = actor.id.to_string();
        let form = encode(&[("actor_id", actor_id.as_str()), ("character", "William James")]);
        let (status, _) =
            send(&app, "POST", &format!("/movies/{}/characters", movie.id), Some(form)).await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let (status, body) = send(&app, "GET", &format!("/movies/{}", movie.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Jeremy Renner"));
        assert!(body.contains("William James"));
        assert!(body.contains("Thriller"));
    }

    #[tokio::test]
    async fn genres_and_actors_pages() {
        let (_dir, app, _catalog) = crate::test_app().await;

        let (status, _) =
            send(&app, "POST", "/genres", Some(encode(&[("name", "Musical"), ("description", "")]))).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let (_, body) = send(&app, "GET", "/genres", None).await;
        assert!(body.contains("Musical"));

        let (status, _) =
            send(&app, "POST", "/actors", Some(encode(&[("name", "Ann"), ("birth_date", "nope")]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
