//! Continuing-education admissions management.
//!
//! Admission and prospect records, the admission state table, role-based
//! permission rules, file uploads and spreadsheet exports, exposed through
//! axum routers that the API service mounts.

pub mod admissions;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod locale;
pub mod prospects;
pub mod seed;
pub mod telemetry;
pub mod validation;
