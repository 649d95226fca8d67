use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::{EmploymentStatus, Role};
use crate::entities::users;

/// Profile fields an admin supplies when creating or replacing a user.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub email: String,
    pub legal_first_name: String,
    pub legal_last_name: String,
    pub preferred_name: Option<String>,
    pub job_title: String,
    pub department: String,
    pub hire_date: NaiveDate,
    pub phone: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub emergency_contact_relationship: String,
    pub role: Role,
    pub employment_status: EmploymentStatus,
}

/// Contact fields a user may update on their own record.
#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub preferred_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address_line1: Option<String>,
    pub address_line2: Option<Option<String>>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn get_by_legal_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::LegalFirstName.eq(first_name))
            .filter(users::Column::LegalLastName.eq(last_name))
            .one(&self.conn)
            .await
            .context("Failed to query user by legal name")
    }

    pub async fn list(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    pub async fn create(
        &self,
        profile: UserProfile,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<users::Model> {
        let password_hash = hash_password_blocking(password, security).await?;

        let model = users::ActiveModel {
            email: Set(profile.email),
            password_hash: Set(password_hash),
            legal_first_name: Set(profile.legal_first_name),
            legal_last_name: Set(profile.legal_last_name),
            preferred_name: Set(profile.preferred_name),
            job_title: Set(profile.job_title),
            department: Set(profile.department),
            hire_date: Set(profile.hire_date),
            phone: Set(profile.phone),
            address_line1: Set(profile.address_line1),
            address_line2: Set(profile.address_line2),
            city: Set(profile.city),
            state: Set(profile.state),
            postal_code: Set(profile.postal_code),
            country: Set(profile.country),
            emergency_contact_name: Set(profile.emergency_contact_name),
            emergency_contact_phone: Set(profile.emergency_contact_phone),
            emergency_contact_relationship: Set(profile.emergency_contact_relationship),
            role: Set(profile.role),
            employment_status: Set(profile.employment_status),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert user")
    }

    /// Full replacement of profile fields (admin update).
    pub async fn update_profile(
        &self,
        user: users::Model,
        profile: UserProfile,
        is_active: bool,
    ) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.email = Set(profile.email);
        active.legal_first_name = Set(profile.legal_first_name);
        active.legal_last_name = Set(profile.legal_last_name);
        active.preferred_name = Set(profile.preferred_name);
        active.job_title = Set(profile.job_title);
        active.department = Set(profile.department);
        active.hire_date = Set(profile.hire_date);
        active.phone = Set(profile.phone);
        active.address_line1 = Set(profile.address_line1);
        active.address_line2 = Set(profile.address_line2);
        active.city = Set(profile.city);
        active.state = Set(profile.state);
        active.postal_code = Set(profile.postal_code);
        active.country = Set(profile.country);
        active.emergency_contact_name = Set(profile.emergency_contact_name);
        active.emergency_contact_phone = Set(profile.emergency_contact_phone);
        active.emergency_contact_relationship = Set(profile.emergency_contact_relationship);
        active.role = Set(profile.role);
        active.employment_status = Set(profile.employment_status);
        active.is_active = Set(is_active);

        active.update(&self.conn).await.context("Failed to update user")
    }

    /// Partial self-service update of contact fields only.
    pub async fn update_contact(
        &self,
        user: users::Model,
        update: ContactUpdate,
    ) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        if let Some(v) = update.preferred_name {
            active.preferred_name = Set(v);
        }
        if let Some(v) = update.phone {
            active.phone = Set(v);
        }
        if let Some(v) = update.address_line1 {
            active.address_line1 = Set(v);
        }
        if let Some(v) = update.address_line2 {
            active.address_line2 = Set(v);
        }
        if let Some(v) = update.city {
            active.city = Set(v);
        }
        if let Some(v) = update.state {
            active.state = Set(v);
        }
        if let Some(v) = update.postal_code {
            active.postal_code = Set(v);
        }
        if let Some(v) = update.emergency_contact_name {
            active.emergency_contact_name = Set(v);
        }
        if let Some(v) = update.emergency_contact_phone {
            active.emergency_contact_phone = Set(v);
        }
        if let Some(v) = update.emergency_contact_relationship {
            active.emergency_contact_relationship = Set(v);
        }
        if let Some(v) = update.country {
            active.country = Set(v);
        }

        active.update(&self.conn).await.context("Failed to update contact fields")
    }

    /// Deletes the user; owned documents, paystubs, reset tokens and audit
    /// rows go with it via FK cascade.
    pub async fn delete(&self, id: i32) -> Result<()> {
        users::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;
        Ok(())
    }

    /// Verify password for a user by email, returning the user on success.
    /// Argon2 verification runs in `spawn_blocking` because it is
    /// CPU-intensive and would stall the async runtime.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_email(email).await? else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then_some(user))
    }

    pub async fn set_password(
        &self,
        user: users::Model,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let new_hash = hash_password_blocking(new_password, security).await?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }
}

async fn hash_password_blocking(password: &str, security: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let security = security.clone();
    task::spawn_blocking(move || hash_password(&password, &security))
        .await
        .context("Password hashing task panicked")?
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, security: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        security.argon2_memory_cost_kib,
        security.argon2_time_cost,
        security.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
