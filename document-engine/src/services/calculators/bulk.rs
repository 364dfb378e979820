//! Bulk calculator: conventional cargo lots.

use async_trait::async_trait;
use engine_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::models::{BulkLot, DocumentCategory, LineSet, LotInput};
use crate::services::calculators::{wrong_shape_message, CategoryCalculator};

pub struct BulkCalculator;

/// A lot after defaults, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedLot {
    pub numero_lot: String,
    pub description: String,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    pub total: Decimal,
}

/// Apply defaults to inbound lots. A missing lot number is synthesized
/// from the position as `LOT-{n}`.
pub(crate) fn normalize_lots(inputs: &[LotInput]) -> Vec<NormalizedLot> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let quantite = input.quantite.unwrap_or(Decimal::ONE);
            let prix_unitaire = input.prix_unitaire.unwrap_or(Decimal::ZERO);
            NormalizedLot {
                numero_lot: input
                    .numero_lot
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| format!("LOT-{}", i + 1)),
                description: input.description.clone().unwrap_or_default().trim().to_string(),
                quantite,
                prix_unitaire,
                total: quantite * prix_unitaire,
            }
        })
        .collect()
}

#[async_trait]
impl CategoryCalculator for BulkCalculator {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::Bulk
    }

    fn validate(&self, lines: &LineSet) -> Vec<String> {
        let inputs = match lines {
            LineSet::Bulk(inputs) => inputs,
            other => return vec![wrong_shape_message(self.category(), other.category())],
        };

        let mut errors = Vec::new();
        if inputs.is_empty() {
            errors.push("lots: at least one lot is required".to_string());
        }

        for (i, lot) in normalize_lots(inputs).iter().enumerate() {
            if lot.description.is_empty() {
                errors.push(format!("lots[{}].description: is required", i));
            }
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
            LineSet::Bulk(inputs) => inputs,
            other => {
                return Err(AppError::Validation(vec![wrong_shape_message(
                    self.category(),
                    other.category(),
                )]))
            }
        };

        // A quantity-zero lot persists and contributes nothing.
        for lot in normalize_lots(inputs) {
            sqlx::query(
                r#"
                INSERT INTO bulk_lots (lot_id, document_id, numero_lot, description, quantite, prix_unitaire, total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(document_id)
            .bind(&lot.numero_lot)
            .bind(&lot.description)
            .bind(lot.quantite)
            .bind(lot.prix_unitaire)
            .bind(lot.total)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert bulk lot: {}", e))
            })?;
        }

        Ok(())
    }

    async fn delete_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM bulk_lots WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete bulk lots: {}", e))
            })?;
        Ok(())
    }

    async fn subtotal(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Decimal, AppError> {
        sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total), 0) FROM bulk_lots WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to compute bulk subtotal: {}", e))
        })
    }

    async fn project_for_conversion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<LineSet, AppError> {
        let lots = sqlx::query_as::<_, BulkLot>(
            r#"
            SELECT lot_id, document_id, numero_lot, description, quantite, prix_unitaire, total, created_utc
            FROM bulk_lots
            WHERE document_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load bulk lots: {}", e)))?;

        Ok(LineSet::Bulk(
            lots.into_iter()
                .map(|lot| LotInput {
                    numero_lot: Some(lot.numero_lot),
                    description: Some(lot.description),
                    quantite: Some(lot.quantite),
                    prix_unitaire: Some(lot.prix_unitaire),
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn missing_lot_number_is_synthesized_from_position() {
        let normalized = normalize_lots(&[
            LotInput {
                description: Some("sacs de riz".to_string()),
                ..Default::default()
            },
            LotInput {
                numero_lot: Some("LOT-A".to_string()),
                description: Some("fûts d'huile".to_string()),
                ..Default::default()
            },
            LotInput {
                numero_lot: Some("  ".to_string()),
                description: Some("palettes".to_string()),
                ..Default::default()
            },
        ]);

        assert_eq!(normalized[0].numero_lot, "LOT-1");
        assert_eq!(normalized[1].numero_lot, "LOT-A");
        assert_eq!(normalized[2].numero_lot, "LOT-3");
    }

    #[test]
    fn quantity_defaults_to_one_and_zero_quantity_is_kept() {
        let normalized = normalize_lots(&[
            LotInput {
                description: Some("a".to_string()),
                prix_unitaire: Some(dec("12.50")),
                ..Default::default()
            },
            LotInput {
                description: Some("b".to_string()),
                quantite: Some(Decimal::ZERO),
                prix_unitaire: Some(dec("99")),
                ..Default::default()
            },
        ]);

        assert_eq!(normalized[0].total, dec("12.50"));
        // Quantity 0 is not an error: the lot persists with total 0
        assert_eq!(normalized[1].quantite, Decimal::ZERO);
        assert_eq!(normalized[1].total, Decimal::ZERO);
    }

    #[test]
    fn validation_requires_description() {
        let errors = BulkCalculator.validate(&LineSet::Bulk(vec![LotInput::default()]));
        assert!(errors.iter().any(|e| e.contains("lots[0].description")));
    }

    #[test]
    fn validation_requires_at_least_one_lot() {
        let errors = BulkCalculator.validate(&LineSet::Bulk(vec![]));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at least one lot"));
    }
}
