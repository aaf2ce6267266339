//! Common regex patterns for service order extraction.
//!
//! Patterns run against whitespace-normalized text, so `\s+` only ever sees
//! single spaces. All of them are case-insensitive.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Order number: "ORDEN DE SERVICIO N° 445"
    pub static ref ORDER_NUMBER: Regex = Regex::new(
        r"(?i)ORDEN\s+DE\s+SERVICIO\s*N[°º]?\s*(\d+)"
    ).unwrap();

    // Notification date: "Fecha de NOTIFICACIÓN DE LA OS: 10/03/2025"
    pub static ref NOTIFICATION_DATE: Regex = Regex::new(
        r"(?i)Fecha\s+de\s+NOTIFICACI[ÓO]N(?:\s+DE\s+LA\s+OS)?\s*[:\-]?\s*(\d{2}/\d{2}/\d{4})"
    ).unwrap();

    // Labeled total: "VALOR TOTAL DEL SERVICIO: S/ 9,000.00"
    pub static ref TOTAL_AMOUNT_LABELED: Regex = Regex::new(
        r"(?i)(?:VALOR\s*TOTAL\s*(?:DEL\s+SERVICIO)?|MONTO\s*TOTAL|TOTAL\s*S/)\s*[:\-]?\s*(?:S/)?\s*([\d,]+\.\d{2})(?:\D|$)"
    ).unwrap();

    // Any soles amount: "S/ 1,250.00"
    pub static ref SOLES_AMOUNT: Regex = Regex::new(
        r"(?i)S/\s*([\d,]+\.\d{2})(?:\D|$)"
    ).unwrap();

    // Declared count: "N° DE ENTREGABLES: 3"
    pub static ref DELIVERABLE_COUNT: Regex = Regex::new(
        r"(?i)(?:N[°º]\s*DE\s*ENTREGABLES?|CANTIDAD\s+DE\s+PRODUCTOS?|N[ÚU]MERO\s+DE\s+ENTREGABLES?)\s*[:\-]?\s*(\d+)"
    ).unwrap();

    // Declaration: "PRIMER ENTREGABLE: HASTA LOS 30 DÍAS"
    pub static ref DELIVERABLE_DECLARATION: Regex = Regex::new(
        r"(?i)\b(PRIMER|SEGUNDO|TERCER|CUARTO|QUINTO|SEXTO|S[ÉE]PTIMO|OCTAVO|NOVENO|D[ÉE]CIMO)\s+ENTREGABLES?\s*[:\-]?\s*HASTA\s+(?:LOS\s+)?(\d{1,4})\s*D[ÍI]AS"
    ).unwrap();
}

/// Collapse every whitespace run (including newlines) to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("ORDEN  DE\n\tSERVICIO\r\n N°  445"),
            "ORDEN DE SERVICIO N° 445"
        );
    }

    #[test]
    fn test_declaration_accents_and_case() {
        assert!(DELIVERABLE_DECLARATION.is_match("séptimo entregable hasta 210 días"));
        assert!(DELIVERABLE_DECLARATION.is_match("DÉCIMO ENTREGABLES - HASTA LOS 300 DIAS"));
        assert!(!DELIVERABLE_DECLARATION.is_match("PRIMERO ENTREGABLE HASTA 30 DIAS"));
        assert!(!DELIVERABLE_DECLARATION.is_match("PRIMER ENTREGABLE HASTA 12345 DIAS"));

        let caps = DELIVERABLE_DECLARATION
            .captures("PRIMER ENTREGABLE HASTA 9999 DIAS")
            .unwrap();
        assert_eq!(&caps[2], "9999");
    }

    #[test]
    fn test_amount_requires_two_fraction_digits() {
        assert!(SOLES_AMOUNT.is_match("S/ 1,250.00"));
        assert!(!SOLES_AMOUNT.is_match("S/ 1,250.5"));
        assert!(!SOLES_AMOUNT.is_match("S/ 1,250.505"));
    }
}
