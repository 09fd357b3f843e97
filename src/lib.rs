//! Household utility-bill reshaping.
//!
//! Bill tables (one row per month, one column per fee category) are turned
//! into per-(year, category) series for line charts and wide tables for
//! detail views, for one property or two properties side by side.

pub mod align;
pub mod combine;
pub mod error;
pub mod loader;
pub mod output;
pub mod reshape;
pub mod schema;
pub mod types;
pub mod util;

pub use align::align;
pub use combine::{compare, Comparison, PropertyData};
pub use error::BillError;
pub use reshape::{reshape, Reshaped};
pub use schema::{PropertySchema, SchemaRegistry};
pub use types::{BillRow, LongRow, Selection, SeriesKey, WideRow, WideTable};
