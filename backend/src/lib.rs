//! # Local Library
//!
//! Catalog of authors, books, genres and physical book copies, served as
//! a CRUD web application.
//!
//! ## Architecture
//!
//! - [`models`]: catalog entities and their typed ids
//! - [`db`]: repository traits plus the in-memory and Postgres backends
//! - [`validation`]: form sanitizing, field rules and typed form schemas
//! - [`services`]: concurrent fan-out reads that assemble page data
//! - [`routes`]: framework-free controllers producing views or redirects
//! - [`http`]: axum router and handlers adapting requests to controllers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod routes;
pub mod services;
pub mod validation;

#[cfg(feature = "http-server")]
pub mod http;
