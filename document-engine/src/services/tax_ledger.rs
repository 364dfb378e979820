//! Monthly tax aggregate bookkeeping.
//!
//! Every issued document contributes its taxable base and tax amounts to
//! the (year, month, tax_code) rows of its creation period. Edits are
//! reconciled by removing the pre-edit contribution and adding the
//! post-edit one, inside the same transaction as the document write.

use chrono::Datelike;
use engine_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use crate::models::{Document, TAX_CODE_CSS, TAX_CODE_TVA};

/// One document's contribution to a single tax code for its period.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxContribution {
    pub year: i32,
    pub month: i32,
    pub tax_code: &'static str,
    pub taxable_base: Decimal,
    pub tax_amount: Decimal,
}

/// Contributions derived from a document's period and money fields.
/// Exempt documents contribute nothing.
pub fn contributions_for(document: &Document) -> Vec<TaxContribution> {
    if document.non_assujetti {
        return Vec::new();
    }

    let year = document.date_creation.year();
    let month = document.date_creation.month() as i32;
    let base = (document.subtotal - document.discount_amount).max(Decimal::ZERO);

    vec![
        TaxContribution {
            year,
            month,
            tax_code: TAX_CODE_TVA,
            taxable_base: base,
            tax_amount: document.vat_amount,
        },
        TaxContribution {
            year,
            month,
            tax_code: TAX_CODE_CSS,
            taxable_base: base,
            tax_amount: document.css_amount,
        },
    ]
}

/// Add a document's contribution to the ledger.
pub async fn add_document(
    tx: &mut Transaction<'_, Postgres>,
    document: &Document,
) -> Result<(), AppError> {
    apply(tx, &contributions_for(document), false).await
}

/// Remove a document's contribution from the ledger (pre-edit state).
pub async fn remove_document(
    tx: &mut Transaction<'_, Postgres>,
    document: &Document,
) -> Result<(), AppError> {
    apply(tx, &contributions_for(document), true).await
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    contributions: &[TaxContribution],
    negate: bool,
) -> Result<(), AppError> {
    for contribution in contributions {
        let sign = if negate {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        };

        sqlx::query(
            r#"
            INSERT INTO monthly_tax_aggregates (year, month, tax_code, taxable_base, tax_amount, updated_utc)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (year, month, tax_code) DO UPDATE
            SET taxable_base = monthly_tax_aggregates.taxable_base + EXCLUDED.taxable_base,
                tax_amount = monthly_tax_aggregates.tax_amount + EXCLUDED.tax_amount,
                updated_utc = NOW()
            "#,
        )
        .bind(contribution.year)
        .bind(contribution.month)
        .bind(contribution.tax_code)
        .bind(contribution.taxable_base * sign)
        .bind(contribution.tax_amount * sign)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update tax aggregate: {}", e))
        })?;
    }

    Ok(())
}
