//! Total amount extraction for soles-denominated service orders.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{SOLES_AMOUNT, TOTAL_AMOUNT_LABELED};
use super::FieldRule;

/// Rule for the total amount: a labeled total first, then any "S/" amount.
pub fn total_amount_rule() -> FieldRule<Decimal> {
    FieldRule {
        name: "total_amount",
        patterns: vec![&*TOTAL_AMOUNT_LABELED, &*SOLES_AMOUNT],
        normalize: parse_soles_amount,
        fallback: |_| Decimal::ZERO,
    }
}

/// Parse an amount with comma thousands separators and two decimals ("9,000.00").
pub fn parse_soles_amount(s: &str) -> Option<Decimal> {
    let cleaned = s.trim().replace(',', "");
    let (integer_part, decimal_part) = cleaned.split_once('.')?;

    if integer_part.is_empty()
        || decimal_part.len() != 2
        || !integer_part.chars().all(|c| c.is_ascii_digit())
        || !decimal_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Format an amount as "S/ 9,000.00".
pub fn format_soles_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.round_dp(2));
    let (sign, unsigned) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (integer_part, decimal_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("S/ {}{}.{}", sign, grouped, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::rules::FieldExtractor;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_soles_amount() {
        assert_eq!(parse_soles_amount("9,000.00"), Some(dec("9000.00")));
        assert_eq!(parse_soles_amount("1,234,567.89"), Some(dec("1234567.89")));
        assert_eq!(parse_soles_amount("450.50"), Some(dec("450.50")));
        assert_eq!(parse_soles_amount(",.00"), None);
        assert_eq!(parse_soles_amount("12.5"), None);
    }

    #[test]
    fn test_format_soles_amount() {
        assert_eq!(format_soles_amount(dec("9000")), "S/ 9,000.00");
        assert_eq!(format_soles_amount(dec("333.33")), "S/ 333.33");
        assert_eq!(format_soles_amount(dec("1234567.891")), "S/ 1,234,567.89");
    }

    #[test]
    fn test_labeled_totals() {
        let rule = total_amount_rule();
        for (text, expected) in [
            ("VALOR TOTAL DEL SERVICIO: S/ 9,000.00", "9000.00"),
            ("Valor Total: 12,500.50", "12500.50"),
            ("MONTO TOTAL - S/ 3,000.00", "3000.00"),
            ("TOTAL S/ 1,500.00", "1500.00"),
        ] {
            assert_eq!(rule.extract(text).map(|m| m.value), Some(dec(expected)), "{text}");
        }
    }

    #[test]
    fn test_labeled_total_preferred_over_earlier_soles_amount() {
        let rule = total_amount_rule();
        let text = "Adelanto S/ 100.00. MONTO TOTAL: S/ 5,000.00";
        assert_eq!(rule.extract(text).unwrap().value, dec("5000.00"));
    }

    #[test]
    fn test_standalone_soles_fallback() {
        let rule = total_amount_rule();
        let text = "la suma de S/ 7,200.00 (siete mil doscientos con 00/100 soles)";
        assert_eq!(rule.extract(text).unwrap().value, dec("7200.00"));
    }

    #[test]
    fn test_rejected_labeled_total_falls_through_to_soles() {
        let rule = total_amount_rule();
        let found = rule.extract("MONTO TOTAL: ,.00 segun detalle S/ 500.00").unwrap();
        assert_eq!(found.value, dec("500.00"));
        assert!(found.confidence < 0.9);
    }

    #[test]
    fn test_no_amount() {
        let rule = total_amount_rule();
        assert!(rule.extract("sin monto").is_none());
        assert!(rule.extract("S/ 1,000.5").is_none());
    }
}
