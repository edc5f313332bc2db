//! Fixed monetary policy.
//!
//! These values encode a contractual rounding agreement with the tax
//! authority, so they are constants rather than runtime configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Tolerance of the monetary equation check (one cent).
pub const MONETARY_TOLERANCE: Decimal = dec!(0.01);

/// Rounding tolerance (one currency unit) used by reconciliation. A gap
/// between gross and payable must strictly exceed it before a retention is
/// inferred from it.
pub const ROUNDING_TOLERANCE: Decimal = dec!(1.00);

/// Tag stored with every record so audits can tell which rules produced it.
pub const ALGORITHM_VERSION: &str = "ubl-monetary/forensic-2.1";

/// `true` when `a` and `b` differ by at most [`MONETARY_TOLERANCE`].
pub fn within_cent(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= MONETARY_TOLERANCE
}

/// `true` when `a` and `b` differ by at most [`ROUNDING_TOLERANCE`].
pub fn within_rounding(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= ROUNDING_TOLERANCE
}
