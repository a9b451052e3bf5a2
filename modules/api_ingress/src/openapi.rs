use utoipa::openapi::{Info, OpenApi, Paths};

use crate::error::ErrorBody;

/// Empty document every module's paths and schemas are merged into.
pub fn base_document() -> OpenApi {
    let mut info = Info::new("Student Registry API", env!("CARGO_PKG_VERSION"));
    info.description = Some("Create and list students".to_string());

    let mut doc = OpenApi::new(info, Paths::new());
    doc.merge(<ErrorDoc as utoipa::OpenApi>::openapi());
    doc
}

#[derive(utoipa::OpenApi)]
#[openapi(components(schemas(ErrorBody)))]
struct ErrorDoc;
