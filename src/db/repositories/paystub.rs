use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::paystubs;

/// Everything needed to persist one paystub row.
#[derive(Debug, Clone)]
pub struct NewPaystub {
    pub user_id: i32,
    pub employee_first_name: String,
    pub employee_last_name: String,
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub pay_date: NaiveDate,
    pub earnings: serde_json::Value,
    pub deductions: serde_json::Value,
    pub gross_pay: Decimal,
    pub total_deductions: Decimal,
    pub net_pay: Decimal,
    pub file_name: Option<String>,
    pub s3_key: Option<String>,
}

pub struct PaystubRepository {
    conn: DatabaseConnection,
}

impl PaystubRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<paystubs::Model>> {
        paystubs::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query paystub")
    }

    /// Paystubs for one user, newest pay date first, optionally narrowed to a
    /// calendar year.
    pub async fn list_for_user(&self, user_id: i32, year: Option<i32>) -> Result<Vec<paystubs::Model>> {
        let mut query = paystubs::Entity::find().filter(paystubs::Column::UserId.eq(user_id));

        if let Some(year) = year {
            let start = NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| anyhow::anyhow!("Invalid year: {year}"))?;
            let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)
                .ok_or_else(|| anyhow::anyhow!("Invalid year: {year}"))?;
            query = query
                .filter(paystubs::Column::PayDate.gte(start))
                .filter(paystubs::Column::PayDate.lt(end));
        }

        query
            .order_by_desc(paystubs::Column::PayDate)
            .all(&self.conn)
            .await
            .context("Failed to list paystubs")
    }

    /// Distinct pay-date years for one user, newest first.
    pub async fn available_years(&self, user_id: i32) -> Result<Vec<i32>> {
        use chrono::Datelike;

        let rows = paystubs::Entity::find()
            .filter(paystubs::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to query paystub years")?;

        let mut years: Vec<i32> = rows.iter().map(|p| p.pay_date.year()).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    pub async fn create(&self, new: NewPaystub) -> Result<paystubs::Model> {
        let model = paystubs::ActiveModel {
            user_id: Set(new.user_id),
            employee_first_name: Set(new.employee_first_name),
            employee_last_name: Set(new.employee_last_name),
            pay_period_start: Set(new.pay_period_start),
            pay_period_end: Set(new.pay_period_end),
            pay_date: Set(new.pay_date),
            earnings: Set(new.earnings),
            deductions: Set(new.deductions),
            gross_pay: Set(new.gross_pay),
            total_deductions: Set(new.total_deductions),
            net_pay: Set(new.net_pay),
            file_name: Set(new.file_name),
            s3_key: Set(new.s3_key),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        model.insert(&self.conn).await.context("Failed to insert paystub")
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        paystubs::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete paystub")?;
        Ok(())
    }
}
