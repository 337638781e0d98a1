use std::sync::Arc;

use crate::feature::BucketField;

/// Represents a result type for operations of the decision engine.
///
/// This `Result` type is a standard Rust `Result` type where the error variant is defined by the
/// engine-specific [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors that can occur in the decision engine.
///
/// All failure modes are typed: consumers are expected to match on the variant and fall back to a
/// safe default treatment instead of retrying (the engine performs no I/O, so a retry can never
/// produce a different answer).
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// One or more feature definitions failed validation at load time. The remaining, valid
    /// features stay usable; this error only reports how many were dropped.
    #[error("{failed_count} feature definition(s) failed to load")]
    Initialization {
        /// Number of feature definitions that were rejected.
        failed_count: usize,
    },

    /// `choose()` was called with a feature name that is not in the loaded feature map, or the
    /// feature is disabled or outside its validity window.
    #[error("feature \"{feature_name}\" not found")]
    FeatureNotFound {
        /// Name the lookup was performed with.
        feature_name: String,
    },

    /// The context is missing the identity field the feature's `bucket_val` selects for hashing.
    #[error("context has no value for \"{field}\", the field selected by bucket_val")]
    MissingContextField {
        /// The bucketing field that was required.
        field: BucketField,
    },

    /// The configuration document itself could not be decoded. Individual malformed features do
    /// not produce this error; they are dropped and recorded in the load report instead.
    #[error("error parsing configuration")]
    // serde_json::Error is not clonable, so we're wrapping it in an Arc.
    ConfigurationParse(#[source] Arc<serde_json::Error>),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::ConfigurationParse(Arc::new(value))
    }
}
