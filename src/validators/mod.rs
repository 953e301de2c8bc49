//! Mechanics rules validation
//!
//! Checks what the mechanics schema alone cannot: that rules reference
//! existing objects, disciplines and sections, that attributes which exclude
//! each other are not combined, and that random tables cover every number
//! exactly once.
//!
//! ```rust,ignore
//! use gamebook_mechanics::validators::BookValidator;
//!
//! let mut validator = BookValidator::new(mechanics, book).with_schema(schema);
//! validator.validate_book();
//! for error in validator.errors() {
//!     eprintln!("{}", error);
//! }
//! ```

pub mod book_validator;
pub mod helpers;
pub mod ranges;
pub mod rules;
pub mod validation;

pub use book_validator::{
    BookValidator, MECHANICS_FILENAME, SCHEMA_FILENAME, SCHEMA_NOT_LOADED,
    SCHEMA_VALIDATOR_ARGS,
};
pub use helpers::{case_bounds, values_as_list};
pub use ranges::{check_coverage, Coverage};
pub use rules::{RuleCheck, RuleKind};
pub use validation::RuleChecker;
