//! Query descriptors → SeaORM `Condition` / `ORDER BY` / `LIMIT OFFSET`.
//! Validation belongs to the API layer; this module only consumes `query_core` types.

use std::collections::HashMap;

use query_core::{Filter, FilterOp, FilterValue, Pagination, Sort, SortDir};
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};
use thiserror::Error;

/// Whitelisted field kind → used to coerce `FilterValue` into `sea_orm::Value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

/// API field name (case-insensitive) → column. Anything not listed here
/// cannot be filtered or sorted on.
#[derive(Clone)]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map
            .insert(api_name.into().to_lowercase(), Field { col, kind });
        self
    }
    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(&name.to_lowercase())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryBuildError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("type mismatch on {field}: expected {expected:?}, got {got}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        got: &'static str,
    },
}
pub type QueryBuildResult<T> = Result<T, QueryBuildError>;

fn coerce(field: &str, kind: FieldKind, v: &FilterValue) -> QueryBuildResult<sea_orm::Value> {
    Ok(match (kind, v) {
        (FieldKind::String, FilterValue::Text(s)) => {
            sea_orm::Value::String(Some(Box::new(s.clone())))
        }
        (FieldKind::I64, FilterValue::Integer(i)) => sea_orm::Value::BigInt(Some(*i)),
        // Fractional operands against integer columns compare numerically (age > 20.5).
        (FieldKind::I64, FilterValue::Float(f)) => sea_orm::Value::Double(Some(*f)),
        (FieldKind::F64, FilterValue::Integer(i)) => sea_orm::Value::Double(Some(*i as f64)),
        (FieldKind::F64, FilterValue::Float(f)) => sea_orm::Value::Double(Some(*f)),
        (expected, other) => {
            return Err(QueryBuildError::TypeMismatch {
                field: field.to_string(),
                expected,
                got: other.kind_name(),
            })
        }
    })
}

/// Build one `AND` condition from a filter list.
///
/// Filters are keyed by field: a later filter on the same field replaces the
/// earlier one, so `age > 18` followed by `age < 30` yields only `age < 30`.
pub fn filters_to_condition<E: EntityTrait>(
    filters: &[Filter],
    fmap: &FieldMap<E>,
) -> QueryBuildResult<Condition>
where
    E::Column: ColumnTrait + Copy,
{
    let mut keyed: Vec<(String, &Filter)> = Vec::with_capacity(filters.len());
    for f in filters {
        let key = f.field.to_lowercase();
        match keyed.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = f,
            None => keyed.push((key, f)),
        }
    }

    let mut cond = Condition::all();
    for (_, f) in keyed {
        let field = fmap
            .get(&f.field)
            .ok_or_else(|| QueryBuildError::UnknownField(f.field.clone()))?;
        let v = coerce(&f.field, field.kind, &f.value)?;
        let e = match f.op {
            FilterOp::Eq => Expr::col(field.col).eq(v),
            FilterOp::Gt => Expr::col(field.col).gt(v),
            FilterOp::Lt => Expr::col(field.col).lt(v),
        };
        cond = cond.add(e);
    }
    Ok(cond)
}

/// Extension on `sea_orm::Select<E>` applying query descriptors.
pub trait QueryExt<E: EntityTrait>: Sized {
    fn apply_filters(self, filters: &[Filter], fmap: &FieldMap<E>) -> QueryBuildResult<Self>;

    /// `None` leaves the select unordered.
    fn apply_sort(self, sort: Option<&Sort>, fmap: &FieldMap<E>) -> QueryBuildResult<Self>;

    fn apply_pagination(self, pagination: &Pagination) -> Self;
}

impl<E> QueryExt<E> for sea_orm::Select<E>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    fn apply_filters(self, filters: &[Filter], fmap: &FieldMap<E>) -> QueryBuildResult<Self> {
        if filters.is_empty() {
            return Ok(self);
        }
        let cond = filters_to_condition::<E>(filters, fmap)?;
        Ok(self.filter(cond))
    }

    fn apply_sort(self, sort: Option<&Sort>, fmap: &FieldMap<E>) -> QueryBuildResult<Self> {
        let Some(sort) = sort else {
            return Ok(self);
        };
        let field = fmap
            .get(&sort.field)
            .ok_or_else(|| QueryBuildError::UnknownField(sort.field.clone()))?;
        let order = match sort.dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        };
        Ok(self.order_by(field.col, order))
    }

    fn apply_pagination(self, pagination: &Pagination) -> Self {
        self.limit(pagination.limit()).offset(pagination.offset())
    }
}
