//! Service order field extraction.

mod parser;
pub mod rules;

pub use parser::{Extraction, ServiceOrderParser};
