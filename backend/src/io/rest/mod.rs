//! # REST API Interface Layer
//!
//! HTTP endpoints for the life manager, one router per entity, all nested
//! under `/api` by [`crate::create_router`].
//!
//! Handlers are a thin translation layer: they log the request, call one
//! service method and turn the outcome into a JSON response. Domain failures
//! go through [`error::error_response`] so every endpoint reports them the
//! same way.

pub mod auth_apis;
pub mod dashboard_apis;
pub mod error;
pub mod expense_apis;
pub mod goal_apis;
pub mod medication_apis;
pub mod planner_apis;
pub mod settings_apis;
pub mod task_apis;

use chrono::{Local, NaiveDate};

/// Local calendar date used for "this month" and "active today" questions
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
