//! Dashboard module
//!
//! Provides the landing page showing how much of the budget is left for a
//! month or a year, overall and per category.

mod aggregation;
mod cards;
mod handlers;
mod period;

pub use handlers::get_dashboard_page;
