//! Service order number extraction.

use super::patterns::ORDER_NUMBER;
use super::FieldRule;

/// Rule for the order number ("ORDEN DE SERVICIO N° 445").
pub fn order_number_rule() -> FieldRule<String> {
    FieldRule {
        name: "order_number",
        patterns: vec![&*ORDER_NUMBER],
        normalize: normalize_order_number,
        fallback: |config| config.default_order_number.clone(),
    }
}

fn normalize_order_number(raw: &str) -> Option<String> {
    let digits = raw.trim();
    if digits.is_empty() {
        None
    } else {
        Some(digits.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::rules::FieldExtractor;

    #[test]
    fn test_order_number_variants() {
        let rule = order_number_rule();
        for text in [
            "ORDEN DE SERVICIO N° 445",
            "Orden de Servicio Nº445",
            "ORDEN DE SERVICIO N 445",
            "orden de servicio n°   445",
        ] {
            let text = super::super::normalize_whitespace(text);
            assert_eq!(rule.extract(&text).map(|m| m.value), Some("445".to_string()), "{text}");
        }
    }

    #[test]
    fn test_first_order_number_wins() {
        let rule = order_number_rule();
        let text = "ORDEN DE SERVICIO N° 12 ... ORDEN DE SERVICIO N° 99";
        assert_eq!(rule.extract(text).unwrap().value, "12");
    }

    #[test]
    fn test_no_order_number() {
        let rule = order_number_rule();
        assert!(rule.extract("ORDEN DE COMPRA N° 445").is_none());
    }
}
