use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::audit::AuditRepository;
pub use repositories::document::DocumentRepository;
pub use repositories::password_reset::PasswordResetRepository;
pub use repositories::paystub::PaystubRepository;
pub use repositories::share::ShareRepository;
pub use repositories::user::UserRepository;
pub use repositories::verification::VerificationRepository;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn shares(&self) -> ShareRepository {
        ShareRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn paystubs(&self) -> PaystubRepository {
        PaystubRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn verifications(&self) -> VerificationRepository {
        VerificationRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn password_resets(&self) -> PasswordResetRepository {
        PasswordResetRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn audit(&self) -> AuditRepository {
        AuditRepository::new(self.conn.clone())
    }
}
