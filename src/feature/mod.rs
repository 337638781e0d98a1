//! Feature model: the wire format, the validated in-memory model, and targeting rules.
mod models;
mod targeting;

pub use models::{
    BucketField, DynamicValue, Experiment, Feature, FeatureKind, FeaturePayload, TryParse,
    ValueType, Variant,
};
pub use targeting::{Comparison, TargetingRule};

pub(crate) use models::FeatureWire;
