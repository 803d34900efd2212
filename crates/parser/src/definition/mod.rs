//! Service definition (`api-2.json`) parser
//!
//! ## Format
//! A service definition contains:
//! - `metadata`: protocol, API version, JSON target prefix, XML namespace
//! - `operations`: HTTP binding plus input/output/error shape references
//! - `shapes`: structures, lists, maps and scalars, with wire-location
//!   metadata on structure members
//!
//! ## Usage
//! ```rust,ignore
//! use sdkgen_parser::ServiceParser;
//!
//! let service = ServiceParser::from_file("models/dynamodb/api-2.json")?
//!     .with_paginators_file("models/dynamodb/paginators-1.json")?
//!     .parse()?;
//! ```

mod converter;
mod parser;
mod types;

pub use parser::ServiceParser;
pub use types::*;
