//! Deliverable detection and schedule derivation.

mod builder;
mod derive;

pub use builder::{reconcile_count, synthesize_placeholders, DeliverableScan, ScheduleBuilder};
pub use derive::{derive_schedule, format_percent};
