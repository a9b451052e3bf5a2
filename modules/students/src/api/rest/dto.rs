use query_core::{FilterOp, SortDir};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::contract::model::{NewStudent, Student};

/// REST DTO for student representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StudentDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Always present; `null` when unknown.
    pub age: Option<i32>,
}

/// Optional key that may be omitted but never sent as `null`.
fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

/// The `email` rule alone accepts `user@host`; require a dotted domain as well.
fn dotted_domain(email: &str) -> Result<(), ValidationError> {
    let domain = email.rsplit_once('@').map_or("", |(_, d)| d);
    if domain.contains('.') && domain.split('.').all(|label| !label.is_empty()) {
        Ok(())
    } else {
        Err(ValidationError::new("email_domain"))
    }
}

/// Body of `POST /student`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateStudentReq {
    #[validate(length(min = 1, max = 30, message = "must be between 1 and 30 characters long"))]
    #[schema(min_length = 1, max_length = 30)]
    pub name: String,
    #[validate(
        email(message = "must be a valid email"),
        custom(function = "dotted_domain", message = "must be a valid email")
    )]
    pub email: String,
    #[validate(range(min = 17, max = 2013, message = "must be between 17 and 2013"))]
    #[serde(default, deserialize_with = "present")]
    #[schema(minimum = 17, maximum = 2013)]
    pub age: Option<i32>,
}

/// `age` condition of a list request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AgeFilterReq {
    /// Integral numbers compare as integers, anything else as floats.
    #[schema(value_type = f64)]
    pub value: serde_json::Number,
    #[serde(default, deserialize_with = "present")]
    pub operator: Option<FilterOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Age,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Age => "age",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SortReq {
    pub field: SortField,
    #[serde(default, deserialize_with = "present")]
    pub direction: Option<SortDir>,
}

/// Body of `POST /student/list`; every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ListStudentsReq {
    #[serde(default, deserialize_with = "present")]
    pub age: Option<AgeFilterReq>,
    /// Page size, defaults to 10.
    #[serde(default, deserialize_with = "present")]
    pub limit: Option<i64>,
    /// 1-based page number, defaults to 1.
    #[serde(default, deserialize_with = "present")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub sort: Option<SortReq>,
}

/// Response of `POST /student`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentCreatedDto {
    pub message: String,
    pub data: StudentDto,
}

/// Response of `POST /student/list`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentListDto {
    pub message: String,
    pub data: Vec<StudentDto>,
}

// Conversion implementations between REST DTOs and contract models

impl From<Student> for StudentDto {
    fn from(s: Student) -> Self {
        Self {
            id: s.id,
            name: s.name,
            email: s.email,
            age: s.age,
        }
    }
}

impl From<CreateStudentReq> for NewStudent {
    fn from(req: CreateStudentReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            age: req.age,
        }
    }
}
