//! Points ledger engine.
//!
//! Maintains per-organization point balances with rule-driven accrual and an
//! append-only history. Every balance change goes through one guarded atomic
//! update (`WHERE points_balance + delta >= 0`) inside a transaction that
//! also appends the matching history row, so a committed mutation always has
//! exactly one ledger entry with the same signed amount and the balance can
//! never go negative, even under concurrent debits.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};
use thiserror::Error;
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::points::{EffectiveRule, OrganizationPoints, PointsHistoryEntry, PointsRule};

#[derive(Debug, Error)]
pub enum PointsError {
    /// A debit would take the balance below zero. The only domain error;
    /// everything else is infrastructure and surfaces unchanged.
    #[error("Недостаточно баллов")]
    InsufficientBalance,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Result of a rule accrual attempt. Disabled points systems and missing or
/// suppressed rules are no-ops, not errors.
#[derive(Debug, Clone)]
pub struct AccrualOutcome {
    pub points_added: Decimal,
    pub rule_name: Option<String>,
    pub message: &'static str,
}

impl AccrualOutcome {
    fn noop(message: &'static str) -> Self {
        Self {
            points_added: Decimal::ZERO,
            rule_name: None,
            message,
        }
    }
}

/// Given the base amount of an active global rule and the organization's
/// optional override columns, compute the effective accrual amount.
/// Enablement defaults to true and the multiplier to 1.0 when there is no
/// override row; an explicit `is_enabled = false` suppresses the rule.
pub fn resolve_effective_amount(
    base_amount: Decimal,
    override_enabled: Option<bool>,
    override_multiplier: Option<Decimal>,
) -> Option<Decimal> {
    if !override_enabled.unwrap_or(true) {
        return None;
    }
    Some(base_amount * override_multiplier.unwrap_or(Decimal::ONE))
}

pub struct PointsService {
    pool: PgPool,
}

impl PointsService {
    pub async fn new() -> Result<Self, PointsError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Fetch the organization's balance row, creating a zeroed disabled row
    /// on first access. Idempotent: the unique constraint on
    /// `organization_id` makes concurrent first calls converge on one row.
    pub async fn get_or_create_balance(
        &self,
        organization_id: i32,
    ) -> Result<OrganizationPoints, PointsError> {
        sqlx::query(
            r#"
            INSERT INTO admin.organization_points
                (organization_id, points_balance, total_earned, total_spent, is_enabled)
            VALUES ($1, 0, 0, 0, false)
            ON CONFLICT (organization_id) DO NOTHING
            "#,
        )
        .bind(organization_id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, OrganizationPoints>(
            r#"
            SELECT id, organization_id, points_balance, total_earned, total_spent,
                   is_enabled, created_at, updated_at
            FROM admin.organization_points
            WHERE organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Credit or debit the balance by a signed amount.
    ///
    /// Balance update, totals update and the history row commit together or
    /// not at all. Returns the new balance.
    pub async fn apply_manual_adjustment(
        &self,
        organization_id: i32,
        amount: Decimal,
        operation_type: &str,
        description: &str,
    ) -> Result<Decimal, PointsError> {
        let mut tx = self.pool.begin().await?;

        // Legacy behavior: a manual adjustment against an unseen organization
        // creates its row with the points system switched on.
        sqlx::query(
            r#"
            INSERT INTO admin.organization_points
                (organization_id, points_balance, total_earned, total_spent, is_enabled)
            VALUES ($1, 0, 0, 0, true)
            ON CONFLICT (organization_id) DO NOTHING
            "#,
        )
        .bind(organization_id)
        .execute(&mut *tx)
        .await?;

        let new_balance = Self::guarded_mutation(&mut tx, organization_id, amount).await?;
        Self::append_history(&mut tx, organization_id, amount, operation_type, description).await?;

        tx.commit().await?;

        debug!(organization_id, %amount, operation_type, "points adjustment committed");
        Ok(new_balance)
    }

    /// Accrue points for an action according to the rule catalog.
    ///
    /// No-op (not an error) when the organization's points system is off,
    /// when no active rule matches `action_type`, or when the organization's
    /// override disables the rule. The optional user activity counter is
    /// updated inside the same transaction, so a failure there rolls back
    /// the accrual too.
    pub async fn apply_rule_accrual(
        &self,
        organization_id: i32,
        action_type: &str,
        user_id: Option<i32>,
    ) -> Result<AccrualOutcome, PointsError> {
        let mut tx = self.pool.begin().await?;

        let enabled: Option<bool> = sqlx::query_scalar(
            "SELECT is_enabled FROM admin.organization_points WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await?;

        if !enabled.unwrap_or(false) {
            return Ok(AccrualOutcome::noop("Баллы для предприятия не включены"));
        }

        let rule = sqlx::query(
            r#"
            SELECT pr.points_amount, pr.rule_name, opr.is_enabled AS org_enabled, opr.multiplier
            FROM admin.points_rules pr
            LEFT JOIN admin.organization_points_rules opr
                ON pr.id = opr.rule_id AND opr.organization_id = $1
            WHERE pr.action_type = $2 AND pr.is_active = true
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .bind(action_type)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(rule) = rule else {
            return Ok(AccrualOutcome::noop("Правило не найдено или выключено"));
        };

        let base_amount: Decimal = rule.try_get("points_amount")?;
        let rule_name: String = rule.try_get("rule_name")?;
        let org_enabled: Option<bool> = rule.try_get("org_enabled")?;
        let multiplier: Option<Decimal> = rule.try_get("multiplier")?;

        let Some(points_to_add) = resolve_effective_amount(base_amount, org_enabled, multiplier)
        else {
            return Ok(AccrualOutcome::noop("Правило не найдено или выключено"));
        };

        // Accrual amounts are conventionally non-negative, but the mutation
        // still runs through the same balance guard as manual debits.
        Self::guarded_mutation(&mut tx, organization_id, points_to_add).await?;
        Self::append_history(
            &mut tx,
            organization_id,
            points_to_add,
            action_type,
            &format!("Автоначисление: {}", rule_name),
        )
        .await?;

        if let Some(user_id) = user_id {
            sqlx::query(
                r#"
                INSERT INTO admin.user_stats (user_id, total_actions)
                VALUES ($1, 1)
                ON CONFLICT (user_id) DO UPDATE
                    SET total_actions = admin.user_stats.total_actions + 1
                "#,
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(organization_id, action_type, %points_to_add, "rule accrual committed");
        Ok(AccrualOutcome {
            points_added: points_to_add,
            rule_name: Some(rule_name),
            message: "Баллы начислены",
        })
    }

    /// Upsert the organization's enablement/multiplier override for a rule.
    /// Configuration only: no history row is produced.
    pub async fn set_rule_override(
        &self,
        organization_id: i32,
        rule_id: i32,
        is_enabled: bool,
        multiplier: Decimal,
    ) -> Result<(), PointsError> {
        sqlx::query(
            r#"
            INSERT INTO admin.organization_points_rules
                (organization_id, rule_id, is_enabled, multiplier)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (organization_id, rule_id)
            DO UPDATE SET is_enabled = EXCLUDED.is_enabled, multiplier = EXCLUDED.multiplier
            "#,
        )
        .bind(organization_id)
        .bind(rule_id)
        .bind(is_enabled)
        .bind(multiplier)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Switch the points system on or off, creating the zeroed balance row
    /// if the organization has never been seen.
    pub async fn set_points_enabled(
        &self,
        organization_id: i32,
        is_enabled: bool,
    ) -> Result<(), PointsError> {
        sqlx::query(
            r#"
            INSERT INTO admin.organization_points
                (organization_id, is_enabled, points_balance, total_earned, total_spent)
            VALUES ($1, $2, 0, 0, 0)
            ON CONFLICT (organization_id)
            DO UPDATE SET is_enabled = EXCLUDED.is_enabled, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(organization_id)
        .bind(is_enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent history entries, newest first.
    pub async fn list_history(
        &self,
        organization_id: i32,
        limit: i64,
    ) -> Result<Vec<PointsHistoryEntry>, PointsError> {
        let rows = sqlx::query_as::<_, PointsHistoryEntry>(
            r#"
            SELECT id, points_amount, operation_type, description, created_at
            FROM admin.points_history
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(organization_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Active global rules with the organization's overrides merged in.
    pub async fn list_rules_for_org(
        &self,
        organization_id: i32,
    ) -> Result<Vec<EffectiveRule>, PointsError> {
        let rows = sqlx::query_as::<_, EffectiveRule>(
            r#"
            SELECT pr.id, pr.rule_name, pr.action_type, pr.points_amount,
                   pr.description, pr.is_active,
                   opr.is_enabled AS org_enabled, opr.multiplier AS org_multiplier,
                   opr.id AS org_rule_id
            FROM admin.points_rules pr
            LEFT JOIN admin.organization_points_rules opr
                ON pr.id = opr.rule_id AND opr.organization_id = $1
            WHERE pr.is_active = true
            ORDER BY pr.action_type, pr.rule_name
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Full rule catalog, including inactive rules.
    pub async fn list_rules(&self) -> Result<Vec<PointsRule>, PointsError> {
        let rows = sqlx::query_as::<_, PointsRule>(
            r#"
            SELECT id, rule_name, action_type, points_amount, description, is_active, created_at
            FROM admin.points_rules
            ORDER BY action_type, rule_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The single balance mutation primitive: an atomic conditional update
    /// that applies the signed amount, bumps the matching total, and fails
    /// the transaction when the balance would go negative. The condition is
    /// evaluated inside the UPDATE, so two concurrent debits cannot both
    /// pass the check against a stale read.
    async fn guarded_mutation(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: i32,
        amount: Decimal,
    ) -> Result<Decimal, PointsError> {
        let row = sqlx::query(
            r#"
            UPDATE admin.organization_points
            SET points_balance = points_balance + $2,
                total_earned = total_earned + GREATEST($2, 0::numeric),
                total_spent = total_spent + GREATEST(-$2, 0::numeric),
                updated_at = CURRENT_TIMESTAMP
            WHERE organization_id = $1 AND points_balance + $2 >= 0
            RETURNING points_balance
            "#,
        )
        .bind(organization_id)
        .bind(amount)
        .fetch_optional(&mut **tx)
        .await?;

        match row {
            Some(row) => Ok(row.try_get("points_balance")?),
            // Dropping the transaction rolls everything back
            None => Err(PointsError::InsufficientBalance),
        }
    }

    async fn append_history(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: i32,
        amount: Decimal,
        operation_type: &str,
        description: &str,
    ) -> Result<(), PointsError> {
        sqlx::query(
            r#"
            INSERT INTO admin.points_history
                (organization_id, points_amount, operation_type, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(organization_id)
        .bind(amount)
        .bind(operation_type)
        .bind(description)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn resolution_defaults_to_base_amount() {
        assert_eq!(resolve_effective_amount(dec(10), None, None), Some(dec(10)));
    }

    #[test]
    fn resolution_applies_override_multiplier() {
        let doubled = resolve_effective_amount(dec(10), Some(true), Some(dec(2)));
        assert_eq!(doubled, Some(dec(20)));

        let halved = resolve_effective_amount(
            dec(10),
            Some(true),
            Some(Decimal::new(5, 1)), // 0.5
        );
        assert_eq!(halved, Some(dec(5)));
    }

    #[test]
    fn resolution_with_enabled_override_but_no_multiplier() {
        assert_eq!(
            resolve_effective_amount(dec(10), Some(true), None),
            Some(dec(10))
        );
    }

    #[test]
    fn disabled_override_suppresses_accrual() {
        assert_eq!(resolve_effective_amount(dec(10), Some(false), Some(dec(2))), None);
    }

    #[test]
    fn repeated_fractional_multipliers_do_not_drift() {
        // 0.1 * 3 accruals must be exactly 0.3 in decimal arithmetic
        let step = resolve_effective_amount(dec(1), None, Some(Decimal::new(1, 1))).unwrap();
        let sum = step + step + step;
        assert_eq!(sum, Decimal::new(3, 1));
    }

    #[test]
    fn noop_outcome_carries_zero_amount() {
        let outcome = AccrualOutcome::noop("Баллы для предприятия не включены");
        assert_eq!(outcome.points_added, Decimal::ZERO);
        assert!(outcome.rule_name.is_none());
    }
}
