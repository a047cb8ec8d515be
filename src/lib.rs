//! Exploratory data analysis of payment transactions.
//!
//! Load a transaction table, optionally derive calendar / FX / first-visit
//! columns, then render one of twelve fixed analyses either in the egui
//! dashboard or as a plain-text report.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod session;
pub mod state;
pub mod stats;
pub mod ui;
pub mod views;
