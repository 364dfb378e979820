//! Money rules: discount application, tax computation, rounding.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{DiscountType, TaxAmounts, TaxRateConfig};

/// Round a money amount to 2 decimal places, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Discount amount for a gross subtotal.
///
/// Percentage values are clamped to 100; fixed values are clamped to the
/// subtotal so the net never goes negative.
pub fn compute_discount(gross: Decimal, discount_type: DiscountType, value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match discount_type {
        DiscountType::None => Decimal::ZERO,
        DiscountType::Percentage => {
            let pct = value.min(Decimal::from(100));
            gross * pct / Decimal::from(100)
        }
        DiscountType::Fixed => value.min(gross).max(Decimal::ZERO),
    }
}

/// Tax amounts for a net subtotal. Exempt documents pay nothing
/// regardless of the rate configuration.
pub fn compute_taxes(net: Decimal, non_assujetti: bool, config: &TaxRateConfig) -> TaxAmounts {
    if non_assujetti {
        return TaxAmounts::default();
    }

    let hundred = Decimal::from(100);
    TaxAmounts {
        vat: if config.vat_enabled {
            net * config.vat_rate / hundred
        } else {
            Decimal::ZERO
        },
        css: if config.css_enabled {
            net * config.css_rate / hundred
        } else {
            Decimal::ZERO
        },
    }
}

/// Fully rounded money fields for one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub taxes: TaxAmounts,
    pub total: Decimal,
}

/// Compute every money field from a gross subtotal.
///
/// All fields are rounded here so they can be written together in a
/// single update; `total = max(0, subtotal - discount) + vat + css`
/// holds exactly on the rounded values.
pub fn compute_document_totals(
    gross: Decimal,
    discount_type: DiscountType,
    discount_value: Decimal,
    non_assujetti: bool,
    config: &TaxRateConfig,
) -> DocumentTotals {
    let subtotal = round_money(gross);
    let discount_amount = round_money(compute_discount(subtotal, discount_type, discount_value));
    let net = (subtotal - discount_amount).max(Decimal::ZERO);

    let raw = compute_taxes(net, non_assujetti, config);
    let taxes = TaxAmounts {
        vat: round_money(raw.vat),
        css: round_money(raw.css),
    };

    DocumentTotals {
        subtotal,
        discount_amount,
        taxes,
        total: net + taxes.sum(),
    }
}
