use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::financial_transactions;

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = financial_transactions)]
pub struct InsertFinancialTransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub category: String,
    pub amount_minor: i64,
    pub provider: String,
    pub reference_id: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
