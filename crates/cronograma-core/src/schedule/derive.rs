//! Payment and date schedule derivation.

use chrono::Days;
use rust_decimal::Decimal;

use crate::error::ScheduleError;
use crate::models::schedule::{Deliverable, ExtractedFields, Schedule, ScheduleRow, ScheduleSummary};

/// Derive the schedule rows for `deliverables`, dividing the total amount by `count`.
///
/// Each share is rounded to cents independently, so the shares need not add
/// up to the total; the total row always carries the contract amount.
/// Exact cent halves use banker's rounding on the decimal value, not binary
/// float rounding: 1000.15 / 2 gives 500.08.
pub fn derive_schedule(
    fields: &ExtractedFields,
    deliverables: &[Deliverable],
    count: u32,
) -> Result<Schedule, ScheduleError> {
    if count == 0 {
        return Err(ScheduleError::NoDeliverables);
    }

    let divisor = Decimal::from(count);
    let mut payment = (fields.total_amount / divisor).round_dp(2);
    payment.rescale(2);
    let percent = format_percent((Decimal::ONE_HUNDRED / divisor).round_dp(2));
    let start = fields.notification_date;

    let mut rows = Vec::with_capacity(deliverables.len() + 1);
    for (i, deliverable) in deliverables.iter().enumerate() {
        let due = start
            .checked_add_days(Days::new(u64::from(deliverable.deadline_days)))
            .ok_or(ScheduleError::DateOverflow {
                start,
                days: deliverable.deadline_days,
            })?;

        rows.push(ScheduleRow {
            order_number: fields.order_number.clone(),
            label: deliverable.label(i + 1),
            deadline_days: Some(deliverable.deadline_days),
            payment_percent: percent.clone(),
            payment_amount: payment,
            start_date: Some(start),
            due_date: Some(due),
        });
    }

    rows.push(ScheduleRow::total(&fields.order_number, fields.total_amount));

    Ok(Schedule {
        rows,
        summary: ScheduleSummary {
            order_number: fields.order_number.clone(),
            total_amount: fields.total_amount,
            notification_date: start,
            deliverable_count: count,
            payment_per_deliverable: payment,
        },
    })
}

/// Render a percentage with at least one fraction digit: "50.0%", "33.33%".
pub fn format_percent(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() == 0 {
        format!("{}.0%", value)
    } else {
        format!("{}%", value)
    }
}
