use std::sync::Arc;

use query_core::{Filter, Pagination, Sort};
use tracing::{debug, info, instrument};

use crate::contract::model::{NewStudent, Student};
use crate::domain::error::DomainError;
use crate::domain::repo::{RepoError, Repository};

/// The repository shape the service depends on.
pub type StudentsRepository = dyn Repository<Student, Draft = NewStudent>;

/// Domain service with the student business rules.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<StudentsRepository>,
}

impl Service {
    pub fn new(repo: Arc<StudentsRepository>) -> Self {
        Self { repo }
    }

    /// Insert a student unless the email is taken.
    ///
    /// The count pre-check rejects the common case without a write; the
    /// unique index on `email` catches concurrent creates that both pass it.
    #[instrument(
        name = "students.service.create_student",
        skip(self),
        fields(email = %new_student.email)
    )]
    pub async fn create_student(&self, new_student: NewStudent) -> Result<Student, DomainError> {
        info!("Creating new student");

        let existing = self
            .repo
            .count(&[Filter::eq("email", new_student.email.as_str())])
            .await?;
        if existing > 0 {
            debug!(existing, "email already present");
            return Err(DomainError::email_already_in_use(new_student.email));
        }

        let email = new_student.email.clone();
        let student = self.repo.insert(new_student).await.map_err(|e| match e {
            RepoError::Conflict(_) => DomainError::email_already_in_use(email),
            other => other.into(),
        })?;

        info!("Successfully created student with id={}", student.id);
        Ok(student)
    }

    #[instrument(
        name = "students.service.list_students",
        skip(self, filters, sort),
        fields(page = pagination.page(), limit = pagination.limit())
    )]
    pub async fn list_students(
        &self,
        filters: Vec<Filter>,
        sort: Option<Sort>,
        pagination: Pagination,
    ) -> Result<Vec<Student>, DomainError> {
        debug!(filters = filters.len(), sorted = sort.is_some(), "Listing students");

        let students = self
            .repo
            .find_all(&filters, sort.as_ref(), &pagination)
            .await?;

        debug!("Successfully listed {} students", students.len());
        Ok(students)
    }
}
