//! Data models for service orders, schedules, and configuration.

pub mod config;
pub mod schedule;
