use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Bootstrap admin credentials. The password must be rotated immediately via
/// the admin password endpoint or a reset token.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "ChangeMeNow";

fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(DEFAULT_ADMIN_PASSWORD.as_bytes(), &salt)
        .expect("Failed to hash default admin password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Documents)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(DocumentShares)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Paystubs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(VerificationRequests)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PasswordResetTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(DocumentAuditLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PaystubAuditLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(VerificationAuditLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PaystubGenerationLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Seed the bootstrap admin so a fresh install is reachable.
        let now = chrono::Utc::now();
        let hire_date = now.date_naive();
        let password_hash = hash_default_password();

        let insert = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::LegalFirstName,
                crate::entities::users::Column::LegalLastName,
                crate::entities::users::Column::JobTitle,
                crate::entities::users::Column::Department,
                crate::entities::users::Column::HireDate,
                crate::entities::users::Column::AddressLine1,
                crate::entities::users::Column::City,
                crate::entities::users::Column::State,
                crate::entities::users::Column::PostalCode,
                crate::entities::users::Column::Country,
                crate::entities::users::Column::EmergencyContactName,
                crate::entities::users::Column::EmergencyContactPhone,
                crate::entities::users::Column::EmergencyContactRelationship,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::EmploymentStatus,
                crate::entities::users::Column::IsActive,
                crate::entities::users::Column::CreatedAt,
            ])
            .values_panic([
                DEFAULT_ADMIN_EMAIL.into(),
                password_hash.into(),
                "Default".into(),
                "Admin".into(),
                "System Administrator".into(),
                "IT".into(),
                hire_date.into(),
                "1 Main St".into(),
                "Springfield".into(),
                "CA".into(),
                "00000".into(),
                "US".into(),
                "None".into(),
                "000-000-0000".into(),
                "N/A".into(),
                "ADMIN".into(),
                "ACTIVE".into(),
                true.into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaystubGenerationLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VerificationAuditLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaystubAuditLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DocumentAuditLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PasswordResetTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VerificationRequests).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Paystubs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DocumentShares).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Documents).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
