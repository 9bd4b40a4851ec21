//! 價格輸入遮罩：以「分」為單位保存原始數字字串，顯示時轉成 `R$ 1.234,56`。
//!
//! 所有運算都在數字字串上進行，任意長度的輸入都不會溢位。
//! 編輯時不保留游標位置：任何輸入都先化為純數字再重新格式化。

use crate::utils::error::{MarketError, Result};

pub const CURRENCY_PREFIX: &str = "R$ ";
const THOUSANDS_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';

/// Renders a minor-unit digit string; `""` stays `""` so "no price" differs from zero.
pub fn format(raw: &str) -> String {
    let digits = unformat(raw);
    if digits.is_empty() {
        return String::new();
    }

    let significant = digits.trim_start_matches('0');
    let padded = format!("{:0>3}", significant);
    let (whole, minor) = padded.split_at(padded.len() - 2);

    format!(
        "{}{}{}{}",
        CURRENCY_PREFIX,
        group_thousands(whole),
        DECIMAL_SEPARATOR,
        minor
    )
}

pub fn unformat(display: &str) -> String {
    display.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `unformat(format(raw))`: no redundant leading zeros, at least three digits.
pub fn canonical(raw: &str) -> String {
    unformat(&format(raw))
}

/// 只讀取開頭的連續數字，例如 `"12a"` → `0.12`；沒有數字時為 `0`
pub fn to_major_units(raw: &str) -> f64 {
    let leading: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if leading.is_empty() {
        return 0.0;
    }
    leading.parse::<f64>().map(|cents| cents / 100.0).unwrap_or(0.0)
}

pub fn from_major_units(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0".to_string();
    }
    format!("{:.0}", (value * 100.0).round())
}

/// 顯示已儲存的價格，例如 `123.45` → `R$ 123,45`
pub fn format_major_units(value: f64) -> String {
    format(&from_major_units(value))
}

/// Reads a masked (or partially typed) price back into major units.
pub fn parse_display(display: &str) -> Result<f64> {
    let digits = unformat(display);
    if digits.is_empty() {
        return Err(MarketError::InvalidPrice {
            input: display.to_string(),
        });
    }
    Ok(to_major_units(&digits))
}

fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceMask {
    raw: String,
}

impl PriceMask {
    pub fn new(initial: &str) -> Self {
        Self {
            raw: canonical(initial),
        }
    }

    pub fn value(&self) -> &str {
        &self.raw
    }

    pub fn formatted_value(&self) -> String {
        format(&self.raw)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn set_value(&mut self, raw: &str) {
        self.raw = canonical(raw);
    }

    pub fn on_input_change(&mut self, new_display_value: &str) {
        self.set_value(new_display_value);
    }

    pub fn major_units(&self) -> f64 {
        to_major_units(&self.raw)
    }

    pub fn set_major_units(&mut self, value: f64) {
        self.set_value(&from_major_units(value));
    }

    pub fn clear(&mut self) {
        self.raw.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_formats_to_empty() {
        assert_eq!(format(""), "");
        assert_eq!(PriceMask::default().formatted_value(), "");
    }

    #[test]
    fn test_zero_is_distinct_from_empty() {
        assert_eq!(format("0"), "R$ 0,00");
        assert_eq!(format("000"), "R$ 0,00");
    }

    #[test]
    fn test_format_splits_whole_and_minor_units() {
        assert_eq!(format("5"), "R$ 0,05");
        assert_eq!(format("005"), "R$ 0,05");
        assert_eq!(format("150"), "R$ 1,50");
        assert_eq!(format("12345"), "R$ 123,45");
        assert_eq!(format("100000"), "R$ 1.000,00");
        assert_eq!(format("123456789"), "R$ 1.234.567,89");
    }

    #[test]
    fn test_format_handles_amounts_beyond_u64() {
        let raw = "123456789012345678901234";
        assert_eq!(
            format(raw),
            "R$ 1.234.567.890.123.456.789.012,34"
        );
        assert_eq!(unformat(&format(raw)), raw);
    }

    #[test]
    fn test_unformat_strips_non_digits() {
        assert_eq!(unformat("R$ 1.234,56"), "123456");
        assert_eq!(unformat("abc"), "");
    }

    #[test]
    fn test_round_trip_for_canonical_values() {
        for n in (0u64..5000).chain([99_999, 100_000, 1_234_567, u64::MAX]) {
            let raw = canonical(&n.to_string());
            assert_eq!(unformat(&format(&raw)), raw, "raw {}", raw);
        }
    }

    #[test]
    fn test_canonical_is_idempotent() {
        for raw in ["", "0", "5", "05", "0005", "12", "120", "000123", "9999999"] {
            let once = canonical(raw);
            assert_eq!(canonical(&once), once, "raw {}", raw);
            assert_eq!(format(&once), format(raw));
        }
    }

    #[test]
    fn test_conversions() {
        assert_eq!(to_major_units("12345"), 123.45);
        assert_eq!(from_major_units(123.45), "12345");
        assert_eq!(to_major_units(""), 0.0);
        assert_eq!(to_major_units("12a"), 0.12);
        assert_eq!(to_major_units("a12"), 0.0);
        assert_eq!(from_major_units(0.1 + 0.2), "30");
        assert_eq!(from_major_units(-4.0), "0");
        assert_eq!(from_major_units(f64::NAN), "0");
    }

    #[test]
    fn test_format_major_units() {
        assert_eq!(format_major_units(123.45), "R$ 123,45");
        assert_eq!(format_major_units(0.0), "R$ 0,00");
        assert_eq!(format_major_units(2500.0), "R$ 2.500,00");
    }

    #[test]
    fn test_parse_display() {
        assert_eq!(parse_display("R$ 1.234,56").unwrap(), 1234.56);
        assert!(matches!(
            parse_display("R$ ,"),
            Err(MarketError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_typing_sequence_reformats_on_each_keystroke() {
        let mut mask = PriceMask::new("");

        mask.on_input_change("1");
        assert_eq!(mask.formatted_value(), "R$ 0,01");

        let next = format!("{}2", mask.formatted_value());
        mask.on_input_change(&next);
        assert_eq!(mask.formatted_value(), "R$ 0,12");

        let next = format!("{}3", mask.formatted_value());
        mask.on_input_change(&next);
        assert_eq!(mask.formatted_value(), "R$ 1,23");
        assert_eq!(mask.value(), "123");

        // backspace
        let mut shorter = mask.formatted_value();
        shorter.pop();
        mask.on_input_change(&shorter);
        assert_eq!(mask.formatted_value(), "R$ 0,12");
        assert_eq!(mask.major_units(), 0.12);
    }

    #[test]
    fn test_mask_holds_digits_only() {
        let mut mask = PriceMask::new("R$ 9,99");
        assert_eq!(mask.value(), "999");

        mask.on_input_change("x");
        assert!(mask.is_empty());
        assert_eq!(mask.formatted_value(), "");

        mask.set_major_units(1500.5);
        assert_eq!(mask.value(), "150050");
        assert_eq!(mask.formatted_value(), "R$ 1.500,50");

        mask.clear();
        assert_eq!(mask.major_units(), 0.0);
    }
}
