//! Notification date extraction.

use chrono::NaiveDate;

use super::patterns::NOTIFICATION_DATE;
use super::FieldRule;

/// Rule for the notification date ("Fecha de NOTIFICACIÓN DE LA OS: 10/03/2025").
pub fn notification_date_rule() -> FieldRule<NaiveDate> {
    FieldRule {
        name: "notification_date",
        patterns: vec![&*NOTIFICATION_DATE],
        normalize: parse_notification_date,
        fallback: |config| config.default_notification_date,
    }
}

/// Parse a DD/MM/YYYY date, rejecting impossible calendar dates.
pub fn parse_notification_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()
}
