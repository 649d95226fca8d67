use sea_orm::entity::prelude::*;

/// Immutable financial snapshot. Line items are stored as JSON arrays of
/// `{label/description, hours?, rate?, amount, ...}` objects; totals are
/// persisted so the stub renders identically even if items change shape.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "paystubs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    pub employee_first_name: String,

    pub employee_last_name: String,

    pub pay_period_start: Date,

    pub pay_period_end: Date,

    pub pay_date: Date,

    pub earnings: Json,

    pub deductions: Json,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub gross_pay: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_deductions: Decimal,

    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub net_pay: Decimal,

    pub file_name: Option<String>,

    /// Set when the PDF lives in the blob store instead of being regenerable.
    pub s3_key: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
