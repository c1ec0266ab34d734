//! Conversion between user-typed decimal strings and raw on-chain integers
//!
//! A raw amount is an integer scaled by `10^decimals`. Conversions here are exact: a string with
//! more fractional digits than the asset supports is rejected instead of rounded.

use std::str::FromStr;

use cosmwasm_std::{StdError, StdResult, Uint128};

/// Number of fractional digits shown in amount labels and produced by the half/max shortcuts
pub const DISPLAY_PLACES: u32 = 6;

/// Whether `input` matches `[0-9]*(\.[0-9]*)?`
///
/// The empty string and a lone `.` are accepted, so the user can clear the field or start typing
/// a fraction; both parse to zero.
pub fn is_valid_input(input: &str) -> bool {
    let mut seen_dot = false;
    input.chars().all(|c| match c {
        '0'..='9' => true,
        '.' if !seen_dot => {
            seen_dot = true;
            true
        }
        _ => false,
    })
}

/// Parse a decimal string into a raw amount with `decimals` fractional digits
pub fn to_integer(input: &str, decimals: u32) -> StdResult<Uint128> {
    if !is_valid_input(input) {
        return Err(StdError::parse_err("Uint128", format!("invalid amount: {:?}", input)));
    }

    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
    if frac.len() > decimals as usize {
        return Err(StdError::generic_err(format!(
            "amount {} has more than {} decimal places",
            input, decimals
        )));
    }

    let whole = if whole.is_empty() {
        Uint128::zero()
    } else {
        Uint128::from_str(whole)?
    };

    let frac = format!("{:0<width$}", frac, width = decimals as usize);
    let frac = if frac.is_empty() {
        Uint128::zero()
    } else {
        Uint128::from_str(&frac)?
    };

    Ok(whole.checked_mul(scale(decimals)?)?.checked_add(frac)?)
}

/// Exact decimal representation of a raw amount, trailing fractional zeros trimmed
pub fn to_display(amount: Uint128, decimals: u32) -> String {
    let (whole, frac) = split_digits(amount.u128(), decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Decimal representation with exactly `places` fractional digits, rounding half up
pub fn to_fixed(amount: Uint128, decimals: u32, places: u32) -> String {
    if places >= decimals {
        let (whole, frac) = split_digits(amount.u128(), decimals);
        return join_fixed(whole, format!("{:0<width$}", frac, width = places as usize));
    }

    let unit = 10u128.pow(decimals - places);
    let (quotient, remainder) = (amount.u128() / unit, amount.u128() % unit);
    // `unit - remainder <= remainder` is `2 * remainder >= unit` without the overflow
    let rounded = if unit - remainder <= remainder {
        quotient + 1
    } else {
        quotient
    };

    let (whole, frac) = split_digits(rounded, places);
    join_fixed(whole, frac)
}

/// Drop the digits of a raw amount beyond `places` fractional digits
pub fn floor_to_places(amount: Uint128, decimals: u32, places: u32) -> Uint128 {
    if places >= decimals {
        return amount;
    }
    let unit = 10u128.pow(decimals - places);
    Uint128::new(amount.u128() / unit * unit)
}

/// Whether a submission of `amount` may be enabled given its `ceiling`
///
/// Zero is never a valid amount.
pub fn is_within_ceiling(amount: Uint128, ceiling: Uint128) -> bool {
    !amount.is_zero() && amount <= ceiling
}

fn scale(decimals: u32) -> StdResult<Uint128> {
    Ok(Uint128::new(10).checked_pow(decimals)?)
}

fn split_digits(raw: u128, decimals: u32) -> (String, String) {
    let decimals = decimals as usize;
    let digits = format!("{:0>width$}", raw, width = decimals + 1);
    let (whole, frac) = digits.split_at(digits.len() - decimals);
    (whole.to_string(), frac.to_string())
}

fn join_fixed(whole: String, frac: String) -> String {
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// The text of an amount field
///
/// Edits that would make the text syntactically invalid are refused, so the field always holds
/// something `to_integer` accepts, given enough decimals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmountInput {
    text: String,
}

impl Default for AmountInput {
    fn default() -> Self {
        AmountInput {
            text: "0".to_string(),
        }
    }
}

impl AmountInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text; returns false and keeps the previous text if `text` is invalid
    pub fn set(&mut self, text: &str) -> bool {
        if !is_valid_input(text) {
            return false;
        }
        self.text = text.to_string();
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text to show in the field: leading zeros are dropped unless they start a fraction
    pub fn display_text(&self) -> String {
        if !self.text.starts_with('0') || self.text[1..].starts_with('.') {
            return self.text.clone();
        }
        let trimmed = self.text.trim_start_matches('0');
        if trimmed.is_empty() || trimmed.starts_with('.') {
            format!("0{}", trimmed)
        } else {
            trimmed.to_string()
        }
    }

    /// Fill in `percent`% of `ceiling`, truncated to `DISPLAY_PLACES` digits so the result never
    /// exceeds the ceiling. Backs the half/max buttons and the slider.
    pub fn set_portion(&mut self, ceiling: Uint128, decimals: u32, percent: u8) {
        let percent = u128::from(percent.min(100));
        let portion = ceiling.multiply_ratio(percent, 100u128);
        let portion = floor_to_places(portion, decimals, DISPLAY_PLACES);
        self.text = to_fixed(portion, decimals, DISPLAY_PLACES.min(decimals));
    }

    pub fn to_amount(&self, decimals: u32) -> StdResult<Uint128> {
        to_integer(&self.text, decimals)
    }
}
