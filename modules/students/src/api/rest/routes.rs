use std::sync::Arc;

use api_ingress::{not_found, ErrorBody};
use axum::{routing::post, Extension, Router};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::config::StudentsConfig;
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::create_student, handlers::list_students),
    components(schemas(
        dto::StudentDto,
        dto::CreateStudentReq,
        dto::ListStudentsReq,
        dto::AgeFilterReq,
        dto::SortReq,
        dto::SortField,
        dto::StudentCreatedDto,
        dto::StudentListDto,
        ErrorBody,
    )),
    tags((name = "students", description = "Student records"))
)]
pub struct StudentsApi;

/// OpenAPI fragment for the routes below.
pub fn openapi() -> utoipa::openapi::OpenApi {
    StudentsApi::openapi()
}

/// `POST /student` and `POST /student/list`; any other method on them is a 404.
pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    config: Arc<StudentsConfig>,
) -> Router {
    let routes = Router::new()
        .route(
            "/student",
            post(handlers::create_student).fallback(not_found),
        )
        .route(
            "/student/list",
            post(handlers::list_students).fallback(not_found),
        )
        .layer(Extension(service))
        .layer(Extension(config));

    router.merge(routes)
}
