//! Tax configuration and monthly tax aggregate models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const TAX_CODE_TVA: &str = "TVA";
pub const TAX_CODE_CSS: &str = "CSS";

/// Active tax rates and their on/off flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TaxRateConfig {
    pub vat_rate: Decimal,
    pub vat_enabled: bool,
    pub css_rate: Decimal,
    pub css_enabled: bool,
}

impl Default for TaxRateConfig {
    /// Documented defaults applied when no configuration row exists.
    fn default() -> Self {
        TaxRateConfig {
            vat_rate: Decimal::from(18),
            vat_enabled: true,
            css_rate: Decimal::ONE,
            css_enabled: true,
        }
    }
}

/// Computed tax amounts for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxAmounts {
    pub vat: Decimal,
    pub css: Decimal,
}

impl TaxAmounts {
    pub fn sum(&self) -> Decimal {
        self.vat + self.css
    }
}

/// Per-month, per-tax-code running total used for periodic tax reporting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonthlyTaxAggregate {
    pub year: i32,
    pub month: i32,
    pub tax_code: String,
    pub taxable_base: Decimal,
    pub tax_amount: Decimal,
    pub updated_utc: DateTime<Utc>,
}
