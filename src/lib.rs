//! Facebook Ads API Library
//!
//! Validates and normalizes campaign, ad set and ad requests into the bodies
//! the Facebook Marketing (Graph) API expects, and exposes them over HTTP
//! together with persistence of the synced hierarchy.
//!
//! # Modules
//!
//! - `circuit_breaker`: Circuit breaker guarding Graph API calls.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Campaign / ad set / ad persistence.
//! - `errors`: Validation and application error types.
//! - `graph_client`: Facebook Graph API client.
//! - `handlers`: HTTP request handlers.
//! - `models`: Request shapes, platform enumerations, targeting, records.
//! - `normalizer`: Request validation and normalization.

pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod graph_client;
pub mod handlers;
pub mod models;
pub mod normalizer;
