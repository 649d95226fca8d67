use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "paystub_audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub event_type: String,

    pub event_metadata: Json,

    pub user_id: i32,

    pub paystub_id: i32,

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
    #[sea_orm(
        belongs_to = "super::paystubs::Entity",
        from = "Column::PaystubId",
        to = "super::paystubs::Column::Id",
        on_delete = "Cascade"
    )]
    Paystub,
}

impl ActiveModelBehavior for ActiveModel {}
