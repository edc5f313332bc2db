//! Decimal-safe conversion of issuer-formatted amount text.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Magnitudes at or above this are not invoice amounts. Rejecting them keeps
/// sums over many tax lines clear of `Decimal` overflow.
const MAX_MAGNITUDE: Decimal = dec!(1000000000000000000);

/// Parse an amount as written by an issuer.
///
/// Accepts plain decimals (`1860700.00`) as well as grouped forms seen in
/// custom fields (`1,860,700.00`, `1.860.700,00`, `$ 1.860.700`). Returns
/// `None` for anything that cannot be read without guessing; never zero.
///
/// A single separator followed by exactly three digits is grouping only when
/// a currency marker surrounds the number (`$ 500.000`); bare `500.000` is
/// ambiguous and yields `None`.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let text = text.trim();
    let trimmed = text.trim_matches(|c: char| {
        !(c.is_ascii_digit() || c == '-' || c == '.' || c == ',')
    });
    let decorated = trimmed.len() != text.len();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let normalized = normalize_separators(body, decorated)?;
    let value = bounded(Decimal::from_str(&normalized).ok()?)?;
    Some(if negative { -value } else { value })
}

/// Parse a schema amount (`xsd:decimal`, as in `cbc:PayableAmount`).
///
/// The lexical form is read strictly first, so `860.700` is 860.7. Text that
/// is not a plain decimal falls back to [`parse_amount`].
pub fn parse_xml_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let plain = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if plain {
        return Decimal::from_str(text).ok().and_then(bounded);
    }
    parse_amount(text)
}

fn bounded(value: Decimal) -> Option<Decimal> {
    (value.abs() < MAX_MAGNITUDE).then_some(value)
}

/// Exactly three digits after a lone separator with a short integer part:
/// `500.000` could be five hundred or five hundred thousand.
fn ambiguous_grouping(body: &str, sep_pos: usize) -> bool {
    let int_len = sep_pos;
    let frac_len = body.len() - sep_pos - 1;
    frac_len == 3 && (1..=3).contains(&int_len) && !body.starts_with('0')
}

fn normalize_separators(body: &str, decorated: bool) -> Option<String> {
    let last_dot = body.rfind('.');
    let last_comma = body.rfind(',');

    match (last_dot, last_comma) {
        (None, None) => Some(body.to_string()),
        (Some(d), Some(c)) => {
            // The separator that appears last is the decimal mark.
            let (decimal_pos, group) = if d > c { (d, ',') } else { (c, '.') };
            let (int_part, frac_part) = body.split_at(decimal_pos);
            let frac_part = &frac_part[1..];
            if frac_part.contains(['.', ',']) || !valid_grouping(int_part, group) {
                return None;
            }
            Some(format!("{}.{}", int_part.replace(group, ""), frac_part))
        }
        (Some(d), None) => {
            if body.matches('.').count() == 1 {
                if !ambiguous_grouping(body, d) {
                    Some(body.to_string())
                } else if decorated {
                    Some(body.replace('.', ""))
                } else {
                    None
                }
            } else if valid_grouping(body, '.') {
                Some(body.replace('.', ""))
            } else {
                None
            }
        }
        (None, Some(c)) => {
            let frac_len = body.len() - c - 1;
            if body.matches(',').count() == 1 && (1..=2).contains(&frac_len) {
                Some(body.replace(',', "."))
            } else if ambiguous_grouping(body, c) && !decorated {
                None
            } else if valid_grouping(body, ',') {
                Some(body.replace(',', ""))
            } else {
                None
            }
        }
    }
}

/// Thousands grouping: a leading group of 1–3 digits, then groups of exactly 3.
fn valid_grouping(int_part: &str, sep: char) -> bool {
    let mut groups = int_part.split(sep);
    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty() || (first.len() > 3 && int_part.contains(sep)) {
        return false;
    }
    groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Format a decimal for audit text: at least 2 decimal places, trailing
/// zeros beyond that stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}
