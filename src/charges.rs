//! Service-charge arithmetic and currency formatting.
//!
//! All amounts are expressed in pence ([`rust_decimal::Decimal`]). The charge
//! is a percentage of the base amount plus a fixed fee, rounded so that the
//! displayed charge never shows more precision than was computed and the
//! total collected is never a fraction of a penny.

use rust_decimal::Decimal;

use crate::error::{Error, invalid_amount};

/// Charge configuration: `percentage` of the base amount plus `fixed_pence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeRates {
    pub percentage: Decimal,
    pub fixed_pence: Decimal,
}

impl ChargeRates {
    pub fn new(percentage: Decimal, fixed_pence: Decimal) -> Self {
        Self {
            percentage,
            fixed_pence,
        }
    }

    /// The service charge for `amount_pence`, in whole pence.
    pub fn service_charge(&self, amount_pence: Decimal) -> Result<Decimal, Error> {
        ensure_non_negative(amount_pence)?;
        Ok(clamp_to_pence(self.raw_charge(amount_pence)))
    }

    /// The total to collect for `amount_pence`: the base amount plus the
    /// unclamped service charge, clamped once at the end so that rounding
    /// error is not compounded.
    pub fn total_charge(&self, amount_pence: Decimal) -> Result<Decimal, Error> {
        ensure_non_negative(amount_pence)?;
        Ok(clamp_to_pence(amount_pence + self.raw_charge(amount_pence)))
    }

    fn raw_charge(&self, amount_pence: Decimal) -> Decimal {
        amount_pence * self.percentage / Decimal::ONE_HUNDRED + self.fixed_pence
    }
}

/// Parses a textual amount in pence, rejecting anything that is not a
/// non-negative number.
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    let amount: Decimal = text
        .trim()
        .parse()
        .map_err(|_| invalid_amount(format!("cannot parse amount: {text:?}")))?;
    ensure_non_negative(amount)?;
    Ok(amount)
}

fn ensure_non_negative(amount: Decimal) -> Result<(), Error> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid_amount(format!("amount must not be negative: {amount}")));
    }
    Ok(())
}

// Truncate to tenths of a penny (toward zero), then round up (away from
// zero) to whole pence.
fn clamp_to_pence(pence: Decimal) -> Decimal {
    let tenths = pence.trunc_with_scale(1);
    if tenths.is_sign_negative() {
        tenths.floor()
    } else {
        tenths.ceil()
    }
}

/// Formats an amount in pounds as currency, e.g. `£17.00`.
pub fn currency_format(pounds: Decimal) -> String {
    format!("£{:.2}", pounds)
}

/// Formats an amount in pence as currency, using the `p` form under £1,
/// e.g. `50p` or `£17.00`.
pub fn currency_format_pence(pence: u64) -> String {
    if pence < 100 {
        format!("{pence}p")
    } else {
        currency_format(Decimal::from(pence) / Decimal::ONE_HUNDRED)
    }
}
