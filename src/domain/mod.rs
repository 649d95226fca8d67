pub mod access;
pub mod verification;

use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};

/// User role. Admins manage records for everyone; employees only see their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sea_orm::EnumIter, sea_orm::DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Role {
    #[sea_orm(string_value = "EMPLOYEE")]
    #[serde(rename = "EMPLOYEE")]
    Employee,
    #[sea_orm(string_value = "ADMIN")]
    #[serde(rename = "ADMIN")]
    Admin,
}

/// Employment status. Former employees keep read access to their records but
/// may not perform any write, regardless of role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sea_orm::EnumIter, sea_orm::DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum EmploymentStatus {
    #[sea_orm(string_value = "ACTIVE")]
    #[serde(rename = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "FORMER_EMPLOYEE")]
    #[serde(rename = "FORMER_EMPLOYEE")]
    FormerEmployee,
}

impl EmploymentStatus {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}
