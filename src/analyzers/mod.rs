//! Aggregation of the filtered event tables into report sections.
//!
//! This module computes unique users, country, device and referral
//! distributions, the repeat-visit histogram, the per-user event count
//! overview, and the per-event-type breakdowns.

pub mod aggregate;
pub mod analyzer;
pub mod breakdown;
pub mod countries;
pub mod types;
pub mod utility;
