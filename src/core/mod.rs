//! Shared record types, errors, amount parsing and monetary policy.

mod amount;
mod error;
pub mod policy;
mod types;

pub use amount::{format_decimal, parse_amount, parse_xml_decimal};
pub use error::*;
pub use types::*;
