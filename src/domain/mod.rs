//! Core domain types and simulation logic.

pub mod price;
pub mod order;
pub mod portfolio;
pub mod router;
pub mod strategy;
pub mod simulator;
pub mod sweep;
pub mod comparison;
pub mod config_validation;
pub mod error;
