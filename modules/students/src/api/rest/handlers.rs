use std::sync::Arc;

use api_ingress::{AppError, ErrorBody};
use axum::{body::Bytes, extract::rejection::BytesRejection, response::Json, Extension};
use tracing::{debug, error};

use crate::api::rest::dto::{
    CreateStudentReq, ListStudentsReq, StudentCreatedDto, StudentDto, StudentListDto,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::validation::{validate_create, validate_list};
use crate::config::StudentsConfig;
use crate::domain::service::Service;

pub const CREATED_MESSAGE: &str = "Student created!";
pub const LISTED_MESSAGE: &str = "Students listed successfully!";

/// Create a new student
#[utoipa::path(
    post,
    path = "/student",
    operation_id = "students.create_student",
    tag = "students",
    request_body = CreateStudentReq,
    responses(
        (status = 200, description = "Created student", body = StudentCreatedDto),
        (status = 400, description = "Invalid payload or email already in use", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn create_student(
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<StudentCreatedDto>, AppError> {
    let new_student = validate_create(&body?).map_err(map_domain_error)?;
    debug!(has_age = new_student.age.is_some(), "Creating student");

    match svc.create_student(new_student).await {
        Ok(student) => Ok(Json(StudentCreatedDto {
            message: CREATED_MESSAGE.to_string(),
            data: StudentDto::from(student),
        })),
        Err(e) => {
            error!("Failed to create student: {}", e);
            Err(map_domain_error(e))
        }
    }
}

/// List students with optional age filter, sort and pagination
#[utoipa::path(
    post,
    path = "/student/list",
    operation_id = "students.list_students",
    tag = "students",
    request_body(content = ListStudentsReq, description = "Query; an empty body lists the first page"),
    responses(
        (status = 200, description = "Page of students", body = StudentListDto),
        (status = 400, description = "Invalid query", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    )
)]
pub async fn list_students(
    Extension(svc): Extension<Arc<Service>>,
    Extension(cfg): Extension<Arc<StudentsConfig>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<StudentListDto>, AppError> {
    let query = validate_list(&body?, &cfg).map_err(map_domain_error)?;
    debug!(
        filters = query.filters.len(),
        page = query.pagination.page(),
        limit = query.pagination.limit(),
        "Listing students"
    );

    match svc
        .list_students(query.filters, query.sort, query.pagination)
        .await
    {
        Ok(students) => Ok(Json(StudentListDto {
            message: LISTED_MESSAGE.to_string(),
            data: students.into_iter().map(StudentDto::from).collect(),
        })),
        Err(e) => {
            error!("Failed to list students: {}", e);
            Err(map_domain_error(e))
        }
    }
}
