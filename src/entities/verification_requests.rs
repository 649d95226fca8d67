use sea_orm::entity::prelude::*;

use crate::domain::verification::VerificationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "employment_verification_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub employee_id: i32,

    pub verifier_name: String,

    pub verifier_company: Option<String>,

    pub verifier_email: Option<String>,

    pub purpose: String,

    pub include_salary: bool,

    pub consent: bool,

    pub status: VerificationStatus,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub salary_amount: Option<Decimal>,

    pub generated_by_user_id: Option<i32>,

    pub generated_at: Option<DateTimeUtc>,

    pub sent_at: Option<DateTimeUtc>,

    pub sent_by_user_id: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub sent_note: Option<String>,

    pub declined_at: Option<DateTimeUtc>,

    pub declined_by_user_id: Option<i32>,

    #[sea_orm(column_type = "Text", nullable)]
    pub decline_reason: Option<String>,

    pub file_name: Option<String>,

    pub s3_key: Option<String>,

    pub created_at: DateTimeUtc,

    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::EmployeeId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::GeneratedByUserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    GeneratedBy,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SentByUserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    SentBy,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::DeclinedByUserId",
        to = "super::users::Column::Id",
        on_delete = "SetNull"
    )]
    DeclinedBy,
}

impl ActiveModelBehavior for ActiveModel {}
