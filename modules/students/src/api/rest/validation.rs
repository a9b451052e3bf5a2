//! Request validation: raw body bytes in, typed descriptors out.
//!
//! Nothing past this module sees unvalidated input. Failures become
//! `DomainError::Validation`, rendered as `Invalid request: <detail>.`.

use query_core::{Filter, FilterValue, Pagination, PaginationError, Sort};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::api::rest::dto::{AgeFilterReq, CreateStudentReq, ListStudentsReq};
use crate::config::StudentsConfig;
use crate::contract::model::NewStudent;
use crate::domain::error::DomainError;

/// Normalized list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub pagination: Pagination,
}

/// Decode a JSON object body; an empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, DomainError> {
    let value: serde_json::Value = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(|e| DomainError::validation(e.to_string()))?
    };
    if !value.is_object() {
        return Err(DomainError::validation("body must be a JSON object"));
    }
    serde_json::from_value(value).map_err(|e| DomainError::validation(e.to_string()))
}

/// First failing field, by name, so the message is stable.
fn first_violation(errors: &ValidationErrors) -> DomainError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let detail = fields
        .first()
        .and_then(|(field, errs)| {
            errs.first().map(|err| match &err.message {
                Some(m) => format!("\"{field}\" {m}"),
                None => format!("\"{field}\" is invalid ({})", err.code),
            })
        })
        .unwrap_or_else(|| "validation failed".to_string());
    DomainError::validation(detail)
}

pub fn validate_create(body: &[u8]) -> Result<NewStudent, DomainError> {
    let req: CreateStudentReq = parse_body(body)?;
    req.validate().map_err(|e| first_violation(&e))?;
    Ok(req.into())
}

fn age_filter(age: AgeFilterReq) -> Filter {
    let value = match age.value.as_i64() {
        Some(i) => FilterValue::Integer(i),
        // Non-integral or beyond i64: JSON numbers always fit an f64.
        None => FilterValue::Float(age.value.as_f64().unwrap_or(f64::NAN)),
    };
    Filter::new("age", age.operator.unwrap_or_default(), value)
}

pub fn validate_list(body: &[u8], cfg: &StudentsConfig) -> Result<ListQuery, DomainError> {
    let req: ListStudentsReq = parse_body(body)?;

    let page = req.page.unwrap_or(1);
    if page < 1 {
        return Err(DomainError::validation(
            "\"page\" must be greater than or equal to 1",
        ));
    }

    let max = cfg.max_page_size;
    let limit = match req.limit {
        None => cfg.default_page_size,
        Some(l) => match u64::try_from(l) {
            Ok(l) if (1..=max).contains(&l) => l,
            _ => {
                return Err(DomainError::validation(format!(
                    "\"limit\" must be between 1 and {max}"
                )))
            }
        },
    };

    let pagination = Pagination::new(page.unsigned_abs(), limit).map_err(|e| match e {
        PaginationError::OutOfRange { .. } => DomainError::validation(format!(
            "\"page\" is too large for a page size of {limit}"
        )),
        other => DomainError::validation(other.to_string()),
    })?;

    Ok(ListQuery {
        filters: req.age.map(age_filter).into_iter().collect(),
        sort: req
            .sort
            .map(|s| Sort::new(s.field.as_str(), s.direction.unwrap_or_default())),
        pagination,
    })
}
