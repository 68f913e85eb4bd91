//! The type mapper: native annotations, SQL types, and conversions between them.
//!
//! - [`native`]: native type descriptors and native → SQL mapping
//! - [`sql`]: SQL type descriptors and catalog type text
//! - [`annotation`]: annotation text parsing
//! - [`coerce`]: argument shape checks, normalization and SQL → native result decoding

pub mod annotation;
pub mod coerce;
pub mod native;
pub mod sql;

pub use annotation::parse_annotation;
pub use coerce::{ShapeMismatch, check_value, conform_value, to_native_value};
pub use native::{NativeType, PathStep, TypePath, UnsupportedType};
pub use sql::{ScalarKind, SqlType};
