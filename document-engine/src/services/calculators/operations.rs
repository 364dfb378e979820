//! Independent-operations calculator: standalone service operations.
//!
//! Validation is delegated per operation type: transport needs a route,
//! rental and storage need either a date pair or an explicit quantity.

use async_trait::async_trait;
use engine_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::models::{DocumentCategory, LineSet, OperationInput, ServiceOperation};
use crate::services::calculators::{wrong_shape_message, CategoryCalculator};

pub const OP_TRANSPORT: &str = "transport";
pub const OP_LOCATION: &str = "location";
pub const OP_ENTREPOSAGE: &str = "entreposage";

pub struct IndependentOpsCalculator;

/// An operation after defaults and day-count derivation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedServiceOp {
    pub operation_type: String,
    pub description: Option<String>,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    pub total: Decimal,
    pub lieu_depart: Option<String>,
    pub lieu_arrivee: Option<String>,
    pub date_debut: Option<chrono::NaiveDate>,
    pub date_fin: Option<chrono::NaiveDate>,
}

/// Derive the billable quantity of an operation. Rental and storage
/// charge per day, both boundary days included.
pub(crate) fn derive_quantity(input: &OperationInput) -> Decimal {
    if let Some(quantite) = input.quantite {
        return quantite;
    }

    let is_day_based = matches!(
        input.operation_type.as_deref(),
        Some(OP_LOCATION) | Some(OP_ENTREPOSAGE)
    );
    if is_day_based {
        if let (Some(debut), Some(fin)) = (input.date_debut, input.date_fin) {
            let days = (fin - debut).num_days() + 1;
            return Decimal::from(days.max(1));
        }
    }

    Decimal::ONE
}

pub(crate) fn normalize_operations(inputs: &[OperationInput]) -> Vec<NormalizedServiceOp> {
    inputs
        .iter()
        .map(|input| {
            let quantite = derive_quantity(input);
            let prix_unitaire = input.prix_unitaire.unwrap_or(Decimal::ZERO);
            NormalizedServiceOp {
                operation_type: input.operation_type.clone().unwrap_or_default(),
                description: input.description.clone().filter(|d| !d.trim().is_empty()),
                quantite,
                prix_unitaire,
                total: quantite * prix_unitaire,
                lieu_depart: input.lieu_depart.clone(),
                lieu_arrivee: input.lieu_arrivee.clone(),
                date_debut: input.date_debut,
                date_fin: input.date_fin,
            }
        })
        .collect()
}

/// Per-type validation sub-strategy.
fn validate_operation(index: usize, input: &OperationInput) -> Vec<String> {
    let mut errors = Vec::new();

    let operation_type = input.operation_type.as_deref().unwrap_or("").trim();
    if operation_type.is_empty() {
        errors.push(format!("operations[{}].operation_type: is required", index));
        return errors;
    }

    match operation_type {
        OP_TRANSPORT => {
            if input.lieu_depart.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(format!("operations[{}].lieu_depart: is required", index));
            }
            if input.lieu_arrivee.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(format!("operations[{}].lieu_arrivee: is required", index));
            }
        }
        OP_LOCATION | OP_ENTREPOSAGE => match (input.date_debut, input.date_fin) {
            (Some(debut), Some(fin)) if fin < debut => {
                errors.push(format!(
                    "operations[{}].date_fin: must not precede date_debut",
                    index
                ));
            }
            (Some(_), Some(_)) => {}
            _ if input.quantite.is_none() => {
                errors.push(format!(
                    "operations[{}]: a start/end date pair or an explicit quantity is required",
                    index
                ));
            }
            _ => {}
        },
        _ => {
            if input.description.as_deref().unwrap_or("").trim().is_empty() {
                errors.push(format!("operations[{}].description: is required", index));
            }
        }
    }

    errors
}

#[async_trait]
impl CategoryCalculator for IndependentOpsCalculator {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::IndependentOps
    }

    fn validate(&self, lines: &LineSet) -> Vec<String> {
        let inputs = match lines {
            LineSet::IndependentOps(inputs) => inputs,
            other => return vec![wrong_shape_message(self.category(), other.category())],
        };

        let mut errors = Vec::new();
        if inputs.is_empty() {
            errors.push("operations: at least one operation is required".to_string());
        }

        for (i, input) in inputs.iter().enumerate() {
            errors.extend(validate_operation(i, input));
        }

        errors
    }

    async fn create_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
        lines: &LineSet,
    ) -> Result<(), AppError> {
        let inputs = match lines {
            LineSet::IndependentOps(inputs) => inputs,
            other => {
                return Err(AppError::Validation(vec![wrong_shape_message(
                    self.category(),
                    other.category(),
                )]))
            }
        };

        for operation in normalize_operations(inputs) {
            sqlx::query(
                r#"
                INSERT INTO service_operations (
                    operation_id, document_id, operation_type, description, quantite, prix_unitaire,
                    total, lieu_depart, lieu_arrivee, date_debut, date_fin
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(document_id)
            .bind(&operation.operation_type)
            .bind(&operation.description)
            .bind(operation.quantite)
            .bind(operation.prix_unitaire)
            .bind(operation.total)
            .bind(&operation.lieu_depart)
            .bind(&operation.lieu_arrivee)
            .bind(operation.date_debut)
            .bind(operation.date_fin)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to insert service operation: {}",
                    e
                ))
            })?;
        }

        Ok(())
    }

    async fn delete_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM service_operations WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to delete service operations: {}",
                    e
                ))
            })?;
        Ok(())
    }

    async fn subtotal(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Decimal, AppError> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total), 0) FROM service_operations WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to compute operations subtotal: {}",
                e
            ))
        })
    }

    async fn project_for_conversion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<LineSet, AppError> {
        let operations = sqlx::query_as::<_, ServiceOperation>(
            r#"
            SELECT operation_id, document_id, operation_type, description, quantite, prix_unitaire,
                total, lieu_depart, lieu_arrivee, date_debut, date_fin, created_utc
            FROM service_operations
            WHERE document_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load service operations: {}", e))
        })?;

        Ok(LineSet::IndependentOps(
            operations
                .into_iter()
                .map(|o| OperationInput {
                    operation_type: Some(o.operation_type),
                    description: o.description,
                    quantite: Some(o.quantite),
                    prix_unitaire: Some(o.prix_unitaire),
                    lieu_depart: o.lieu_depart,
                    lieu_arrivee: o.lieu_arrivee,
                    date_debut: o.date_debut,
                    date_fin: o.date_fin,
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_count_is_inclusive_of_both_boundaries() {
        let input = OperationInput {
            operation_type: Some(OP_ENTREPOSAGE.to_string()),
            date_debut: Some(date(2026, 3, 1)),
            date_fin: Some(date(2026, 3, 10)),
            prix_unitaire: Some(dec("5000")),
            ..Default::default()
        };
        assert_eq!(derive_quantity(&input), dec("10"));

        let ops = normalize_operations(&[input]);
        assert_eq!(ops[0].total, dec("50000"));
    }

    #[test]
    fn same_day_rental_counts_as_one_day() {
        let input = OperationInput {
            operation_type: Some(OP_LOCATION.to_string()),
            date_debut: Some(date(2026, 3, 1)),
            date_fin: Some(date(2026, 3, 1)),
            ..Default::default()
        };
        assert_eq!(derive_quantity(&input), Decimal::ONE);
    }

    #[test]
    fn explicit_quantity_wins_over_date_pair() {
        let input = OperationInput {
            operation_type: Some(OP_LOCATION.to_string()),
            quantite: Some(dec("3")),
            date_debut: Some(date(2026, 3, 1)),
            date_fin: Some(date(2026, 3, 31)),
            ..Default::default()
        };
        assert_eq!(derive_quantity(&input), dec("3"));
    }

    #[test]
    fn transport_requires_route() {
        let errors = IndependentOpsCalculator.validate(&LineSet::IndependentOps(vec![
            OperationInput {
                operation_type: Some(OP_TRANSPORT.to_string()),
                lieu_depart: Some("Port d'Owendo".to_string()),
                ..Default::default()
            },
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("lieu_arrivee"));
    }

    #[test]
    fn rental_requires_dates_or_quantity() {
        let missing = IndependentOpsCalculator.validate(&LineSet::IndependentOps(vec![
            OperationInput {
                operation_type: Some(OP_LOCATION.to_string()),
                ..Default::default()
            },
        ]));
        assert_eq!(missing.len(), 1);

        let with_quantity = IndependentOpsCalculator.validate(&LineSet::IndependentOps(vec![
            OperationInput {
                operation_type: Some(OP_LOCATION.to_string()),
                quantite: Some(dec("4")),
                ..Default::default()
            },
        ]));
        assert!(with_quantity.is_empty());
    }

    #[test]
    fn inverted_date_pair_is_rejected() {
        let errors = IndependentOpsCalculator.validate(&LineSet::IndependentOps(vec![
            OperationInput {
                operation_type: Some(OP_ENTREPOSAGE.to_string()),
                date_debut: Some(date(2026, 3, 10)),
                date_fin: Some(date(2026, 3, 1)),
                ..Default::default()
            },
        ]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("date_fin"));
    }

    #[test]
    fn missing_operation_type_is_rejected() {
        let errors =
            IndependentOpsCalculator.validate(&LineSet::IndependentOps(vec![Default::default()]));
        assert!(errors[0].contains("operation_type"));
    }
}
