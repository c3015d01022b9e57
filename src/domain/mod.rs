//! Core domain types and logic.

pub mod asset;
pub mod commission;
pub mod config;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod price;
pub mod price_table;
pub mod recorder;
pub mod schedule;
pub mod selector;
pub mod signal;
pub mod simulator;
pub mod universe;
