//! Integer minor-unit money arithmetic and the presentation-boundary
//! conversions to and from decimal strings.
//!
//! Amounts are always a signed 64-bit count of minor currency units (cents).
//! Floats never enter storage or the sync queue; the functions here are the
//! sole conversion gateway.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when converting between decimal text and minor units.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
    #[error("amount `{0}` out of range")]
    OutOfRange(String),
}

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

/// Locale-aware formatting preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "en-US".into(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NegativeStyle {
    Sign,
    Parentheses,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CurrencyDisplay {
    Symbol,
    Code,
    SymbolAndCode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatOptions {
    pub currency_display: CurrencyDisplay,
    pub negative_style: NegativeStyle,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            currency_display: CurrencyDisplay::Symbol,
            negative_style: NegativeStyle::Sign,
        }
    }
}

/// Parses a decimal amount into minor units using the default locale.
pub fn to_minor_units(input: &str) -> Result<i64, MoneyError> {
    to_minor_units_with(input, &LocaleConfig::default())
}

/// Parses a decimal amount into minor units, rounding half-up past two
/// fractional digits. Grouping separators before the decimal point are
/// stripped without position checks, so `1,234.56` and `12,34.56` parse
/// to the same value; a separator after the decimal point is an error.
pub fn to_minor_units_with(input: &str, locale: &LocaleConfig) -> Result<i64, MoneyError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(MoneyError::InvalidAmount(input.to_string()));
    }

    let mut negative = false;
    let mut integer = String::new();
    let mut fraction = String::new();
    let mut seen_decimal = false;
    let mut seen_digit = false;

    for ch in raw.chars() {
        if ch == locale.grouping_separator && !seen_decimal {
            continue;
        }
        if ch == locale.decimal_separator {
            if seen_decimal {
                return Err(MoneyError::InvalidAmount(input.to_string()));
            }
            seen_decimal = true;
            continue;
        }
        match ch {
            '-' if !seen_digit && !negative && !seen_decimal => negative = true,
            '+' if !seen_digit && !seen_decimal => {}
            '0'..='9' => {
                seen_digit = true;
                if seen_decimal {
                    fraction.push(ch);
                } else {
                    integer.push(ch);
                }
            }
            _ => return Err(MoneyError::InvalidAmount(input.to_string())),
        }
    }

    if !seen_digit {
        return Err(MoneyError::InvalidAmount(input.to_string()));
    }

    let whole: i64 = if integer.is_empty() {
        0
    } else {
        integer
            .parse()
            .map_err(|_| MoneyError::OutOfRange(input.to_string()))?
    };

    let mut frac_digits = fraction.chars();
    let tens = frac_digits.next().and_then(|c| c.to_digit(10)).unwrap_or(0) as i64;
    let units = frac_digits.next().and_then(|c| c.to_digit(10)).unwrap_or(0) as i64;
    let round_up = frac_digits
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d >= 5)
        .unwrap_or(false);

    let mut cents = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(tens * 10 + units))
        .ok_or_else(|| MoneyError::OutOfRange(input.to_string()))?;
    if round_up {
        cents = cents
            .checked_add(1)
            .ok_or_else(|| MoneyError::OutOfRange(input.to_string()))?;
    }
    if negative {
        cents = -cents;
    }
    Ok(cents)
}

/// Canonical two-fractional-digit rendering, e.g. `-12.05`.
pub fn to_decimal_string(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Formats minor units for display with grouping, symbol, and negative style.
pub fn format_minor_units(
    cents: i64,
    code: &CurrencyCode,
    locale: &LocaleConfig,
    options: &FormatOptions,
) -> String {
    let abs = cents.unsigned_abs();
    let grouped = group_digits(&(abs / 100).to_string(), locale.grouping_separator);
    let mut body = format!("{}{}{:02}", grouped, locale.decimal_separator, abs % 100);
    if cents < 0 {
        body = match options.negative_style {
            NegativeStyle::Sign => format!("-{}", body),
            NegativeStyle::Parentheses => format!("({})", body),
        };
    }
    let symbol = symbol_for(code.as_str());
    match options.currency_display {
        CurrencyDisplay::Symbol => format!("{}{}", symbol, body),
        CurrencyDisplay::Code => format!("{} {}", code.as_str(), body),
        CurrencyDisplay::SymbolAndCode => format!("{}{} ({})", symbol, body, code.as_str()),
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "USD" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "JPY" => "¥".into(),
        "BRL" => "R$".into(),
        "CAD" => "CAD".into(),
        "AUD" => "A$".into(),
        "CHF" => "CHF".into(),
        _ => code.into(),
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    let mut count = 0;
    for ch in digits.chars().rev() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
        count += 1;
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(to_minor_units("12.34").unwrap(), 1234);
        assert_eq!(to_minor_units("0.5").unwrap(), 50);
        assert_eq!(to_minor_units("7").unwrap(), 700);
        assert_eq!(to_minor_units("-3.10").unwrap(), -310);
        assert_eq!(to_minor_units(".99").unwrap(), 99);
    }

    #[test]
    fn rounds_half_up_past_two_digits() {
        assert_eq!(to_minor_units("1.005").unwrap(), 101);
        assert_eq!(to_minor_units("1.004").unwrap(), 100);
        assert_eq!(to_minor_units("2.999").unwrap(), 300);
    }

    #[test]
    fn tolerates_grouping_separators() {
        assert_eq!(to_minor_units("1,234.56").unwrap(), 123456);
        // positions are not checked, only stripped
        assert_eq!(to_minor_units("1,,2,3").unwrap(), 12300);
        assert_eq!(to_minor_units(",5").unwrap(), 500);
        // but grouping inside the fraction is malformed
        assert!(matches!(
            to_minor_units("1.2,3"),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            to_minor_units("abc"),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(matches!(
            to_minor_units("1.2.3"),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(matches!(to_minor_units(""), Err(MoneyError::InvalidAmount(_))));
        assert!(matches!(
            to_minor_units("--5"),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn round_trip_is_idempotent() {
        for input in ["0", "0.01", "12.34", "-12.34", "999999.99", "1,000.00", "3.1"] {
            let cents = to_minor_units(input).unwrap();
            let display = to_decimal_string(cents);
            assert_eq!(to_minor_units(&display).unwrap(), cents, "input {input}");
        }
    }

    #[test]
    fn formats_with_locale() {
        let locale = LocaleConfig {
            language_tag: "pt-BR".into(),
            decimal_separator: ',',
            grouping_separator: '.',
        };
        let formatted = format_minor_units(
            123456789,
            &CurrencyCode::new("BRL"),
            &locale,
            &FormatOptions::default(),
        );
        assert_eq!(formatted, "R$1.234.567,89");
    }

    #[test]
    fn negative_parentheses_style() {
        let formatted = format_minor_units(
            -5000,
            &CurrencyCode::default(),
            &LocaleConfig::default(),
            &FormatOptions {
                currency_display: CurrencyDisplay::Symbol,
                negative_style: NegativeStyle::Parentheses,
            },
        );
        assert_eq!(formatted, "$(50.00)");
    }
}
