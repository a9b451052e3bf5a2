//! SeaORM-backed repository implementation for the domain port.
//!
//! This struct is generic over `C: ConnectionTrait`, so you can construct it
//! with a `DatabaseConnection` **or** a transactional connection.

use db::query::{FieldKind, FieldMap, QueryBuildError, QueryExt};
use query_core::{Filter, Pagination, Sort};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ConnectionTrait, EntityTrait, PaginatorTrait, Set,
};

use crate::contract::model::{NewStudent, Student};
use crate::domain::repo::{RepoError, Repository};
use crate::infra::storage::entity::{ActiveModel as StudentAM, Column, Entity as StudentEntity};

/// Fields callers may filter or sort on.
fn field_map() -> FieldMap<StudentEntity> {
    FieldMap::new()
        .insert("name", Column::Name, FieldKind::String)
        .insert("email", Column::Email, FieldKind::String)
        .insert("age", Column::Age, FieldKind::I64)
}

fn invalid_query(e: QueryBuildError) -> RepoError {
    RepoError::InvalidQuery(e.to_string())
}

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmStudentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
    fields: FieldMap<StudentEntity>,
}

impl<C> SeaOrmStudentsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            fields: field_map(),
        }
    }
}

#[async_trait::async_trait]
impl<C> Repository<Student> for SeaOrmStudentsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    type Draft = NewStudent;

    async fn insert(&self, draft: NewStudent) -> Result<Student, RepoError> {
        let m = StudentAM {
            id: NotSet,
            name: Set(draft.name),
            email: Set(draft.email),
            age: Set(draft.age),
        };
        match m.insert(&self.conn).await {
            Ok(stored) => Ok(stored.into()),
            Err(e) if db::is_unique_violation(&e) => {
                Err(RepoError::Conflict(format!("Can't create object: {e}")))
            }
            Err(e) => Err(RepoError::Storage(format!("Can't create object: {e}"))),
        }
    }

    async fn find_all(
        &self,
        filters: &[Filter],
        sort: Option<&Sort>,
        pagination: &Pagination,
    ) -> Result<Vec<Student>, RepoError> {
        let rows = StudentEntity::find()
            .apply_filters(filters, &self.fields)
            .and_then(|s| s.apply_sort(sort, &self.fields))
            .map_err(invalid_query)?
            .apply_pagination(pagination)
            .all(&self.conn)
            .await
            .map_err(|e| RepoError::Storage(format!("Can't list objects: {e}")))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filters: &[Filter]) -> Result<u64, RepoError> {
        StudentEntity::find()
            .apply_filters(filters, &self.fields)
            .map_err(invalid_query)?
            .count(&self.conn)
            .await
            .map_err(|e| RepoError::Storage(format!("Can't count objects: {e}")))
    }
}
