//! Request validation for incoming launch text
//!
//! Accepts `Name|Symbol|Supply` and produces a typed [`LaunchRequest`].
//! Pure: no I/O, no shared state.

use crate::errors::LaunchError;
use crate::types::LaunchRequest;
use alloy::primitives::U256;

/// Field separator in launch text
pub const FIELD_SEPARATOR: char = '|';

/// Whether a chat message should be routed to the launch pipeline at all
pub fn is_launch_text(text: &str) -> bool {
    text.trim().contains(FIELD_SEPARATOR)
}

/// Parse and sanitize raw launch text.
///
/// Exactly two separators are required. Name and symbol are trimmed and must
/// be non-empty; the supply is a base-10 integer with an optional sign and
/// optional `_` grouping between digits. Only zero may carry a minus sign.
pub fn parse_launch_text(text: &str) -> Result<LaunchRequest, LaunchError> {
    let text = text.trim();

    let separators = text.matches(FIELD_SEPARATOR).count();
    if separators != 2 {
        return Err(LaunchError::malformed(format!(
            "expected Name|Symbol|Supply, found {} field(s)",
            separators + 1
        )));
    }

    let mut fields = text.splitn(3, FIELD_SEPARATOR).map(str::trim);
    let (name, symbol, supply) = match (fields.next(), fields.next(), fields.next()) {
        (Some(name), Some(symbol), Some(supply)) => (name, symbol, supply),
        _ => return Err(LaunchError::malformed("expected exactly three fields")),
    };

    let supply_whole = parse_supply(supply)?;
    LaunchRequest::new(name, symbol, supply_whole)
}

/// Parse a non-negative base-10 integer of whole tokens
fn parse_supply(raw: &str) -> Result<U256, LaunchError> {
    let invalid = || LaunchError::InvalidSupply {
        input: raw.to_string(),
    };

    let (negative, body) = match raw.as_bytes().first() {
        Some(b'+') => (false, &raw[1..]),
        Some(b'-') => (true, &raw[1..]),
        _ => (false, raw),
    };

    if !is_grouped_digits(body) {
        return Err(invalid());
    }

    let digits: String = body.chars().filter(|c| *c != '_').collect();
    let value = U256::from_str_radix(&digits, 10).map_err(|_| invalid())?;
    if negative && !value.is_zero() {
        return Err(invalid());
    }
    Ok(value)
}

/// ASCII digits, with single underscores allowed only between two digits
fn is_grouped_digits(body: &str) -> bool {
    let bytes = body.as_bytes();
    if bytes.first().map_or(true, |b| !b.is_ascii_digit())
        || bytes.last().map_or(true, |b| !b.is_ascii_digit())
    {
        return false;
    }
    bytes
        .windows(2)
        .all(|w| w[1].is_ascii_digit() || (w[1] == b'_' && w[0].is_ascii_digit()))
        && bytes.iter().all(|b| b.is_ascii_digit() || *b == b'_')
}
