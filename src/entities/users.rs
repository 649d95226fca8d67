use sea_orm::entity::prelude::*;

use crate::domain::{EmploymentStatus, Role};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub legal_first_name: String,

    pub legal_last_name: String,

    pub preferred_name: Option<String>,

    pub job_title: String,

    pub department: String,

    pub hire_date: Date,

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

    pub is_active: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::documents::Entity")]
    Documents,
    #[sea_orm(has_many = "super::paystubs::Entity")]
    Paystubs,
}

impl ActiveModelBehavior for ActiveModel {}
