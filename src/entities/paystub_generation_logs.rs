use sea_orm::entity::prelude::*;

/// Generation events are not tied to a paystub row: a failed or superseded
/// generation still leaves a trace.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "paystub_generation_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub event_type: String,

    pub event_metadata: Json,

    pub user_id: i32,

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

impl ActiveModelBehavior for ActiveModel {}
