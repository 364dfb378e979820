//! Category calculators: one line-item strategy per document category.

mod bulk;
mod container;
mod operations;

pub use bulk::BulkCalculator;
pub use container::ContainerCalculator;
pub use operations::IndependentOpsCalculator;

use async_trait::async_trait;
use engine_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::models::{DocumentCategory, LineSet};

/// Common contract for the three line-item shapes. The lifecycle factory
/// never knows which shape a document carries; it routes through this
/// trait via [`calculator_for`].
#[async_trait]
pub trait CategoryCalculator: Send + Sync {
    fn category(&self) -> DocumentCategory;

    /// Field-level validation. Never fails; an empty list means the
    /// payload is acceptable.
    fn validate(&self, lines: &LineSet) -> Vec<String>;

    /// Normalize and persist the child rows of a document.
    async fn create_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
        lines: &LineSet,
    ) -> Result<(), AppError>;

    /// Delete all child rows, including nested operation rows.
    async fn delete_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<(), AppError>;

    /// Pre-tax subtotal over all persisted lines.
    async fn subtotal(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<Decimal, AppError>;

    /// Re-project persisted lines into the inbound shape for conversion
    /// and duplication. Lossless for every field the factory consumes.
    async fn project_for_conversion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        document_id: Uuid,
    ) -> Result<LineSet, AppError>;
}

/// Closed registry keyed by category.
pub fn calculator_for(category: DocumentCategory) -> &'static dyn CategoryCalculator {
    match category {
        DocumentCategory::Container => &ContainerCalculator,
        DocumentCategory::Bulk => &BulkCalculator,
        DocumentCategory::IndependentOps => &IndependentOpsCalculator,
    }
}

pub(crate) fn wrong_shape_message(expected: DocumentCategory, got: DocumentCategory) -> String {
    format!(
        "lines: expected {} lines, got {}",
        expected.as_str(),
        got.as_str()
    )
}
