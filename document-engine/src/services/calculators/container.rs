//! Container calculator: container lines owning nested operation rows.

use async_trait::async_trait;
use engine_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::models::{
    ContainerInput, ContainerLine, ContainerOperation, ContainerOperationInput, DocumentCategory,
    LineSet,
};
use crate::services::calculators::{wrong_shape_message, CategoryCalculator};

const DEFAULT_OPERATION_TYPE: &str = "autre";

pub struct ContainerCalculator;

/// A container line after defaults and cleanup, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedContainer {
    pub numero: String,
    pub taille: String,
    pub description: Option<String>,
    pub prix_base: Decimal,
    pub operations: Vec<NormalizedOperation>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedOperation {
    pub operation_type: String,
    pub quantite: Decimal,
    pub prix_unitaire: Decimal,
    pub total: Decimal,
}

/// Apply defaults and cleanup to inbound container lines. Sizes often
/// arrive with a trailing quote mark (`40'`); it is stripped before
/// storage.
pub(crate) fn normalize_containers(inputs: &[ContainerInput]) -> Vec<NormalizedContainer> {
    inputs
        .iter()
        .map(|input| NormalizedContainer {
            numero: input.numero.clone().unwrap_or_default().trim().to_string(),
            taille: input
                .taille
                .clone()
                .unwrap_or_default()
                .trim()
                .trim_end_matches('\'')
                .to_string(),
            description: input.description.clone().filter(|d| !d.trim().is_empty()),
            prix_base: input.prix_unitaire.unwrap_or(Decimal::ZERO),
            operations: input.operations.iter().map(normalize_operation).collect(),
        })
        .collect()
}

fn normalize_operation(input: &ContainerOperationInput) -> NormalizedOperation {
    let quantite = input.quantite.unwrap_or(Decimal::ONE);
    let prix_unitaire = input.prix_unitaire.unwrap_or(Decimal::ZERO);
    NormalizedOperation {
        operation_type: input
            .operation_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPERATION_TYPE.to_string()),
        quantite,
        prix_unitaire,
        total: quantite * prix_unitaire,
    }
}

/// Pre-tax subtotal over normalized containers: base prices plus every
/// owned operation's total. A container with zero operations still
/// contributes its base price.
pub(crate) fn containers_subtotal(containers: &[NormalizedContainer]) -> Decimal {
    containers
        .iter()
        .map(|c| c.prix_base + c.operations.iter().map(|o| o.total).sum::<Decimal>())
        .sum()
}

#[async_trait]
impl CategoryCalculator for ContainerCalculator {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::Container
    }

    fn validate(&self, lines: &LineSet) -> Vec<String> {
        let inputs = match lines {
            LineSet::Container(inputs) => inputs,
            other => return vec![wrong_shape_message(self.category(), other.category())],
        };

        let mut errors = Vec::new();
        if inputs.is_empty() {
            errors.push("containers: at least one container is required".to_string());
        }

        for (i, container) in normalize_containers(inputs).iter().enumerate() {
            if container.numero.is_empty() {
                errors.push(format!("containers[{}].numero: is required", i));
            }
            if container.taille.is_empty() {
                errors.push(format!("containers[{}].taille: is required", i));
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
            LineSet::Container(inputs) => inputs,
            other => {
                return Err(AppError::Validation(vec![wrong_shape_message(
                    self.category(),
                    other.category(),
                )]))
            }
        };

        for container in normalize_containers(inputs) {
            let line_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO container_lines (line_id, document_id, numero, taille, description, prix_base)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(line_id)
            .bind(document_id)
            .bind(&container.numero)
            .bind(&container.taille)
            .bind(&container.description)
            .bind(container.prix_base)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert container line: {}", e))
            })?;

            for operation in &container.operations {
                sqlx::query(
                    r#"
                    INSERT INTO container_operations (operation_id, line_id, operation_type, quantite, prix_unitaire, total)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(line_id)
                .bind(&operation.operation_type)
                .bind(operation.quantite)
                .bind(operation.prix_unitaire)
                .bind(operation.total)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!(
                        "Failed to insert container operation: {}",
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    async fn delete_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM container_operations
            WHERE line_id IN (SELECT line_id FROM container_lines WHERE document_id = $1)
            "#,
        )
        .bind(document_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to delete container operations: {}", e))
        })?;

        sqlx::query("DELETE FROM container_lines WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete container lines: {}", e))
            })?;

        Ok(())
    }

    async fn subtotal(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Decimal, AppError> {
        sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE((SELECT SUM(prix_base) FROM container_lines WHERE document_id = $1), 0)
                 + COALESCE((SELECT SUM(o.total)
                             FROM container_operations o
                             JOIN container_lines l ON l.line_id = o.line_id
                             WHERE l.document_id = $1), 0)
            "#,
        )
        .bind(document_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to compute container subtotal: {}", e))
        })
    }

    async fn project_for_conversion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<LineSet, AppError> {
        let lines = sqlx::query_as::<_, ContainerLine>(
            r#"
            SELECT line_id, document_id, numero, taille, description, prix_base, created_utc
            FROM container_lines
            WHERE document_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(document_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load container lines: {}", e))
        })?;

        let mut projected = Vec::with_capacity(lines.len());
        for line in lines {
            let operations = sqlx::query_as::<_, ContainerOperation>(
                r#"
                SELECT operation_id, line_id, operation_type, quantite, prix_unitaire, total, created_utc
                FROM container_operations
                WHERE line_id = $1
                ORDER BY created_utc
                "#,
            )
            .bind(line.line_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to load container operations: {}",
                    e
                ))
            })?;

            projected.push(ContainerInput {
                numero: Some(line.numero),
                taille: Some(line.taille),
                description: line.description,
                prix_unitaire: Some(line.prix_base),
                operations: operations
                    .into_iter()
                    .map(|o| ContainerOperationInput {
                        operation_type: Some(o.operation_type),
                        quantite: Some(o.quantite),
                        prix_unitaire: Some(o.prix_unitaire),
                    })
                    .collect(),
            });
        }

        Ok(LineSet::Container(projected))
    }
}
