#![warn(clippy::all, missing_docs)]

//! Core domain logic for the lending library manager.
//!
//! This crate hosts the catalog model and its lending rules, the
//! line-oriented file format, configuration handling, and the file store
//! used by the command-line manager and any future frontends.

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod runtime;
pub mod store;

pub use catalog::Catalog;
pub use config::AppConfig;
pub use error::{LibraryError, Result};
pub use models::{LoanState, Patron, Publication, PublicationKind};
pub use runtime::Runtime;
pub use store::{CatalogStore, StoreEntry};
