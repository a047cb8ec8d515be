//! Analysis views: each one reads the session table and produces the
//! statistics tables and chart specifications the shell renders.
//!
//! ```text
//!   &Table ──► View::render ──► handler ──► ViewOutput { tables, charts }
//! ```
//!
//! Views never mutate the table they are given.

pub mod handlers;
pub mod output;

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::data::model::Table;
use crate::error::EdaError;
use output::ViewOutput;

/// The fixed set of analyses offered in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
pub enum View {
    #[default]
    BasicStats,
    OrderCreation,
    PaymentAmount,
    Users,
    FxRates,
    DeliveryOption,
    CountriesCurrencies,
    UserDemographics,
    UserFirstVisit,
    UserBehavior,
    Seasonality,
    UserRetention,
}

impl View {
    /// All views in side-panel order.
    pub const ALL: [View; 12] = [
        View::BasicStats,
        View::OrderCreation,
        View::PaymentAmount,
        View::Users,
        View::FxRates,
        View::DeliveryOption,
        View::CountriesCurrencies,
        View::UserDemographics,
        View::UserFirstVisit,
        View::UserBehavior,
        View::Seasonality,
        View::UserRetention,
    ];

    /// Human-readable name shown in the side panel.
    pub fn label(self) -> &'static str {
        match self {
            View::BasicStats => "Basic Stats",
            View::OrderCreation => "Order Creation",
            View::PaymentAmount => "Payment Amount",
            View::Users => "Users",
            View::FxRates => "FX Rates",
            View::DeliveryOption => "Delivery Option",
            View::CountriesCurrencies => "Countries & Currencies",
            View::UserDemographics => "User Demographics",
            View::UserFirstVisit => "User First Visit",
            View::UserBehavior => "User Behavior",
            View::Seasonality => "Seasonality",
            View::UserRetention => "User Retention",
        }
    }

    /// Page header for the view.
    pub fn header(self) -> String {
        format!("{} Analysis", self.label())
    }

    /// Run the view's handler over the table.
    pub fn render(self, table: &Table) -> Result<ViewOutput, EdaError> {
        log::debug!("Rendering '{}' over {} rows", self.label(), table.len());
        let handler: fn(&Table) -> Result<ViewOutput, EdaError> = match self {
            View::BasicStats => handlers::basic_stats,
            View::OrderCreation => handlers::order_creation,
            View::PaymentAmount => handlers::payment_amount,
            View::Users => handlers::users,
            View::FxRates => handlers::fx_rates,
            View::DeliveryOption => handlers::delivery_option,
            View::CountriesCurrencies => handlers::countries_currencies,
            View::UserDemographics => handlers::user_demographics,
            View::UserFirstVisit => handlers::user_first_visit,
            View::UserBehavior => handlers::user_behavior,
            View::Seasonality => handlers::seasonality,
            View::UserRetention => handlers::user_retention,
        };
        handler(table)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
