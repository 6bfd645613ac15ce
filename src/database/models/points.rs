use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Per-organization balance row (`admin.organization_points`).
///
/// Lazily created with zeroed counters on first access; never deleted.
/// `points_balance` is never negative after a committed mutation, and the
/// two totals only ever grow.
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationPoints {
    pub id: i32,
    pub organization_id: i32,
    pub points_balance: Decimal,
    pub total_earned: Decimal,
    pub total_spent: Decimal,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the append-only ledger (`admin.points_history`).
#[derive(Debug, Clone, FromRow)]
pub struct PointsHistoryEntry {
    pub id: i32,
    pub points_amount: Decimal,
    pub operation_type: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Global rule joined with the organization's optional override row.
/// Override columns are NULL when the organization has no override.
#[derive(Debug, Clone, FromRow)]
pub struct EffectiveRule {
    pub id: i32,
    pub rule_name: String,
    pub action_type: String,
    pub points_amount: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub org_enabled: Option<bool>,
    pub org_multiplier: Option<Decimal>,
    pub org_rule_id: Option<i32>,
}

/// Catalog view of a global rule without override columns.
#[derive(Debug, Clone, FromRow)]
pub struct PointsRule {
    pub id: i32,
    pub rule_name: String,
    pub action_type: String,
    pub points_amount: Decimal,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
