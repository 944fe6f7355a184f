//! Core domain types and logic.

pub mod ohlcv;
pub mod quote;
pub mod position;
pub mod portfolio;
pub mod indicator;
pub mod backtest;
pub mod metrics;
pub mod strategy;
pub mod scoring;
pub mod service;
pub mod config_validation;
pub mod error;
