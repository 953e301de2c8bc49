//! # gamebook-mechanics
//!
//! Validation of gamebook mechanics: the XML rules that drive combats,
//! random tables, object picks and conditional choices of an interactive
//! Project Aon book.
//!
//! ## Features
//!
//! - Schema validation of the mechanics document (pluggable backend)
//! - Cross-reference checks between rules, sections, objects and disciplines
//! - Random table coverage checks
//! - Concurrent download of book, mechanics and object files
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gamebook_mechanics::{BookRepository, BookValidator, Language, RepositoryConfig, SchemaCache};
//!
//! let repository = BookRepository::new(RepositoryConfig::default().with_base("www/data"));
//! let schema = Arc::new(SchemaCache::new());
//! repository.download_schema(&schema).await?;
//!
//! let mut validator = BookValidator::download(&repository, 1, Language::En, schema).await?;
//! validator.validate_book();
//! println!("{:#?}", validator.errors());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Resource loading
pub mod config;
pub mod locations;
pub mod loaders;
pub mod documents;

// Book data model
pub mod book;
pub mod mechanics;
pub mod section;
pub mod repository;

// Validation
pub mod schema;
pub mod validators;

// Re-exports for convenience
pub use book::{Book, Language};
pub use config::RepositoryConfig;
pub use error::{Error, Result};
pub use mechanics::Mechanics;
pub use repository::BookRepository;
pub use schema::{SchemaCache, SchemaValidator, XsdValidator};
pub use section::Section;
pub use validators::BookValidator;

/// Version of the gamebook-mechanics library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_1_0_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
