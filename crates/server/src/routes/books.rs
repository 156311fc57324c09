//! Collection handlers for `/books`.
//!
//! Mutations answer `200` with an empty body. Errors carry only a status code.

use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::{Map, Value};
use service::books::Book;
use tracing::info;

use crate::errors::ApiError;
use crate::metrics;
use crate::routes::ServerState;

/// Book from a JSON or an urlencoded form body. Form fields are kept as strings.
pub struct BookBody(pub Book);

#[async_trait]
impl<S> FromRequest<S> for BookBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            let fields: Map<String, Value> =
                pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
            Ok(BookBody(Book::from_fields(fields)))
        } else {
            let Json(book) = Json::<Book>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(BookBody(book))
        }
    }
}

#[utoipa::path(
    get,
    path = "/books",
    tag = "Books",
    responses(
        (status = 200, description = "The list of the books", body = [crate::openapi::BookDoc]),
        (status = 503, description = "Collection not loaded")
    )
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Book>>, ApiError> {
    metrics::record_request("list");
    let books = state.books.list().await?;
    info!(count = books.len(), "list books");
    Ok(Json(books))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "Books",
    params(("id" = String, Path, description = "The book id")),
    responses(
        (status = 200, description = "The book description by id", body = crate::openapi::BookDoc),
        (status = 404, description = "The book was not found")
    )
)]
pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    metrics::record_request("get");
    state.books.get(&id).await?.map(Json).ok_or(ApiError::NotFound)
}

#[utoipa::path(
    post,
    path = "/books",
    tag = "Books",
    request_body(
        content = crate::openapi::BookDoc,
        content_type = "application/json",
        description = "JSON object; an urlencoded form is accepted as well"
    ),
    responses(
        (status = 200, description = "The book was successfully created"),
        (status = 409, description = "A book with this id exists (strict ids only)"),
        (status = 500, description = "Some server error")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    BookBody(book): BookBody,
) -> Result<StatusCode, ApiError> {
    metrics::record_request("create");
    let id = book.id_label();
    state.books.create(book).await?;
    info!(id = id.as_deref().unwrap_or("-"), "book created");
    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "Books",
    params(("id" = String, Path, description = "The book id")),
    request_body = crate::openapi::BookDoc,
    responses(
        (status = 200, description = "The book was updated"),
        (status = 404, description = "The book was not found (only with missing_is_not_found)"),
        (status = 500, description = "Some error happened")
    )
)]
pub async fn replace(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    BookBody(book): BookBody,
) -> Result<StatusCode, ApiError> {
    metrics::record_request("replace");
    let removed = state.books.replace(&id, book).await?;
    info!(%id, removed, "book replaced");
    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "Books",
    params(("id" = String, Path, description = "The book id")),
    responses(
        (status = 200, description = "The book was deleted"),
        (status = 404, description = "The book was not found (only with missing_is_not_found)"),
        (status = 500, description = "Some error happened")
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    metrics::record_request("delete");
    let removed = state.books.delete(&id).await?;
    info!(%id, removed, "book deleted");
    Ok(StatusCode::OK)
}
