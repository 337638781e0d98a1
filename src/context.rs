use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::feature::BucketField;
use crate::Str;

/// Type alias for a HashMap holding the free-form part of a request context.
///
/// Keys are field names referenced by targeting rules.
pub type OtherFields = HashMap<String, ContextValue>;

/// Enum representing possible values of a free-form context field.
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`, and `bool` types.
///
/// Examples:
/// ```
/// # use decider_core::ContextValue;
/// let string_field: ContextValue = "example".into();
/// let number_field: ContextValue = 42.0.into();
/// let bool_field: ContextValue = true.into();
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, From, Clone)]
#[serde(untagged)]
pub enum ContextValue {
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A null value or absence of value.
    Null,
}

impl ContextValue {
    pub fn as_str(&self) -> Option<&str> {
        if let ContextValue::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    /// Numeric view of the value. Numeric strings count (callers writing rules against request
    /// headers rarely control the wire type).
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            ContextValue::Number(n) => Some(*n),
            ContextValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// A transient, per-call request context.
///
/// The identity fields supply the string an experiment hashes to place the request into a variant
/// (which one is used is selected by the feature's `bucket_val`). `other_fields` carries anything
/// targeting rules may look at. A context lives for one `choose` call and is never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    /// Identifier of the logged-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Str>,
    /// Identifier of the device making the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<Str>,
    /// Canonical URL of the content being served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<Str>,
    /// Free-form fields available to targeting rules.
    #[serde(flatten)]
    pub other_fields: OtherFields,
}

impl Context {
    /// The identity field selected by a feature's `bucket_val`, if the caller supplied it.
    pub fn bucketing_field(&self, field: BucketField) -> Option<&str> {
        match field {
            BucketField::UserId => self.user_id.as_deref(),
            BucketField::DeviceId => self.device_id.as_deref(),
            BucketField::CanonicalUrl => self.canonical_url.as_deref(),
        }
    }
}
