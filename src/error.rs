use thiserror::Error;

/// Errors raised by the reshaping core and schema handling.
///
/// File and CSV failures are not listed here; the loader and output
/// functions surface those as `Box<dyn Error>` alongside these.
#[derive(Debug, Error, PartialEq)]
pub enum BillError {
    #[error("category `{category}` is not part of the {property} vocabulary")]
    UnknownCategory { property: String, category: String },

    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    #[error("cannot resolve series label `{label}`: {reason}")]
    AmbiguousSeries { label: String, reason: String },

    #[error("{source_name} is missing required column `{column}`")]
    MissingColumn { source_name: String, column: String },

    #[error("invalid schema for `{property}`: {reason}")]
    InvalidSchema { property: String, reason: String },
}
