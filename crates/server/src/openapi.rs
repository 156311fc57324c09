use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Documented shape of a book. Stored records are not validated against it:
/// any field may be missing or hold any JSON value, and extra fields are kept.
#[derive(ToSchema)]
#[schema(example = json!({
    "id": "d5fE_asz",
    "title": "The New Turing Omnibus",
    "author": "Alexander K. Dewdney"
}))]
pub struct BookDoc {
    /// The id of the book, supplied by the caller
    pub id: Option<String>,
    /// The book title
    pub title: String,
    /// The book author
    pub author: String,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Library API", version = "1.0.0", description = "A simple Library API"),
    paths(
        crate::routes::health,
        crate::routes::readiness,
        crate::routes::books::list,
        crate::routes::books::get,
        crate::routes::books::create,
        crate::routes::books::replace,
        crate::routes::books::delete,
    ),
    components(
        schemas(
            HealthResponse,
            BookDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "Books", description = "The books managing API")
    )
)]
pub struct ApiDoc;
