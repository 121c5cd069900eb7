//! JSON surface over the same catalog operations as the HTML routes.
//! Conflicts come back as `409` with the conflict payload.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequest, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    AppState,
    catalog::{DeleteOutcome, EditOutcome},
    error::{ApiError, ApiResult},
    models::{Movie, MovieDelete, MovieFields, MovieUpdate},
};

/// `Json` whose rejections answer like every other API error.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    ApiJson(fields): ApiJson<MovieFields>,
) -> ApiResult<(StatusCode, Json<Movie>)> {
    let movie = state.catalog.create_movie(&fields).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Movie>> {
    Ok(Json(state.catalog.get_movie(id).await?))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    ApiJson(update): ApiJson<MovieUpdate>,
) -> ApiResult<Response> {
    let resp = match state.catalog.apply_edit(id, &update.fields, &update.row_version).await? {
        EditOutcome::Applied(movie) => Json(movie).into_response(),
        EditOutcome::ModifiedConflict(conflict) => {
            (StatusCode::CONFLICT, Json(json!({ "outcome": "modified", "conflict": conflict })))
                .into_response()
        },
        EditOutcome::DeletedConflict => {
            (StatusCode::CONFLICT, Json(json!({ "outcome": "deleted" }))).into_response()
        },
    };
    Ok(resp)
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    ApiJson(delete): ApiJson<MovieDelete>,
) -> ApiResult<Response> {
    let resp = match state.catalog.apply_delete(id, &delete.row_version).await? {
        DeleteOutcome::Deleted | DeleteOutcome::AlreadyDeleted => {
            StatusCode::NO_CONTENT.into_response()
        },
        DeleteOutcome::ModifiedConflict(conflict) => {
            (StatusCode::CONFLICT, Json(json!({ "outcome": "modified", "conflict": conflict })))
                .into_response()
        },
    };
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, header},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            },
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    async fn create(app: &Router, genre_id: i32) -> Value {
        let (status, movie) = send(
            app,
            "POST",
            "/api/movies",
            Some(json!({
                "title": "A",
                "director": "Agnès Varda",
                "release_date": "1962-04-11",
                "gross": "120000.00",
                "rating": 8.0,
                "genre_id": genre_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        movie
    }

    fn edit(movie: &Value, title: &str, row_version: &Value) -> Value {
        let mut body = movie.clone();
        body["title"] = json!(title);
        body["row_version"] = row_version.clone();
        body
    }

    #[tokio::test]
    async fn stale_put_returns_conflict_payload() {
        let (_dir, app, catalog) = crate::test_app().await;
        let genre = catalog.create_genre("Nouvelle Vague", "").await.unwrap();
        let movie = create(&app, genre.id).await;
        let id = movie["id"].as_i64().unwrap();
        let uri = format!("/api/movies/{id}");
        let t0 = movie["row_version"].clone();

        let (status, updated) = send(&app, "PUT", &uri, Some(edit(&movie, "B", &t0))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "B");
        assert_ne!(updated["row_version"], t0);

        let (status, body) = send(&app, "PUT", &uri, Some(edit(&movie, "C", &t0))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body,
            json!({
                "outcome": "modified",
                "conflict": {
                    "changes": [{ "field": "Title", "current": "B" }],
                    "row_version": updated["row_version"],
                },
            })
        );

        let (_, current) = send(&app, "GET", &uri, None).await;
        assert_eq!(current, updated);
    }

    #[tokio::test]
    async fn put_after_delete_reports_deleted() {
        let (_dir, app, catalog) = crate::test_app().await;
        let genre = catalog.create_genre("Nouvelle Vague", "").await.unwrap();
        let movie = create(&app, genre.id).await;
        let uri = format!("/api/movies/{}", movie["id"]);
        let t0 = movie["row_version"].clone();

        let (status, _) = send(&app, "DELETE", &uri, Some(json!({ "row_version": t0 }))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "PUT", &uri, Some(edit(&movie, "B", &t0))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({ "outcome": "deleted" }));

        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (status, _) = send(&app, "DELETE", &uri, Some(json!({ "row_version": t0 }))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn create_with_unknown_genre_is_bad_request() {
        let (_dir, app, _catalog) = crate::test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/movies",
            Some(json!({
                "title": "Orphan",
                "director": "",
                "release_date": "2000-01-01",
                "gross": "0",
                "rating": 1.0,
                "genre_id": 9999,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("genre_id"));
    }

    #[tokio::test]
    async fn undecodable_token_is_bad_request() {
        let (_dir, app, catalog) = crate::test_app().await;
        let genre = catalog.create_genre("Nouvelle Vague", "").await.unwrap();
        let movie = create(&app, genre.id).await;
        let uri = format!("/api/movies/{}", movie["id"]);

        let (status, body) =
            send(&app, "PUT", &uri, Some(edit(&movie, "B", &json!("not base64!")))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("row_version"));

        let (status, body) =
            send(&app, "DELETE", &uri, Some(json!({ "row_version": "not base64!" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("row_version"));

        let (_, current) = send(&app, "GET", &uri, None).await;
        assert_eq!(current, movie);
    }

    #[tokio::test]
    async fn malformed_gross_is_bad_request() {
        let (_dir, app, catalog) = crate::test_app().await;
        let genre = catalog.create_genre("Nouvelle Vague", "").await.unwrap();
        let movie = create(&app, genre.id).await;
        let uri = format!("/api/movies/{}", movie["id"]);

        let mut body = edit(&movie, "B", &movie["row_version"]);
        body["gross"] = json!("1.234");
        let (status, resp) = send(&app, "PUT", &uri, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(resp["error"].as_str().unwrap().contains("gross"));

        let mut body = movie.clone();
        body["release_date"] = json!("1962-13-40");
        let (status, resp) = send(&app, "POST", "/api/movies", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(resp["error"].is_string());

        let (_, current) = send(&app, "GET", &uri, None).await;
        assert_eq!(current, movie);
    }
}
