//! Core types and shared functionality for shelfscan.
//!
//! This crate provides:
//! - Unified error types, including per-URL fetch failures
//! - Configuration structures with layered loading
//! - The source → URL registry
//! - Product records and the validated search query

pub mod config;
pub mod error;
pub mod product;
pub mod registry;

pub use config::{AppConfig, ConfigError};
pub use error::{Error, FetchCause, FetchError};
pub use product::{ProductRecord, Query};
pub use registry::UrlRegistry;
