use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::StudentsConfig;
use crate::domain::service::Service;
use crate::infra::storage::{migrations::Migrator, SeaOrmStudentsRepository};

/// Name of the module's config section under `modules:`.
pub const MODULE_NAME: &str = "students";

/// The students module: repository, service and REST routes wired together.
#[derive(Clone)]
pub struct Students {
    service: Arc<Service>,
    config: Arc<StudentsConfig>,
}

impl Students {
    /// Wire a SeaORM-backed repository into the domain service.
    /// Fails when the page size settings are inconsistent.
    pub fn new(conn: DatabaseConnection, config: StudentsConfig) -> anyhow::Result<Self> {
        info!("Initializing students module");
        config.validate()?;
        debug!(
            "Loaded students config: default_page_size={}, max_page_size={}",
            config.default_page_size, config.max_page_size
        );

        let repo = SeaOrmStudentsRepository::new(conn);
        Ok(Self {
            service: Arc::new(Service::new(Arc::new(repo))),
            config: Arc::new(config),
        })
    }

    pub async fn migrate(conn: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running students database migrations");
        Migrator::up(conn, None).await?;
        info!("Students database migrations completed successfully");
        Ok(())
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn register_rest(&self, router: Router) -> Router {
        info!("Registering students REST routes");
        routes::register_routes(router, self.service.clone(), self.config.clone())
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        routes::openapi()
    }
}
