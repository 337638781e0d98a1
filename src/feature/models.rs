use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

use super::TargetingRule;
use crate::Str;

/// `TryParse` allows the subfield to fail parsing without failing the parsing of the whole
/// structure.
///
/// This is what keeps a single malformed feature definition from taking down the rest of the
/// configuration: if one entry fails to parse, the other features are still usable.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum TryParse<T> {
    /// Successfully parsed.
    Parsed(T),
    /// Parsing failed.
    ParseFailed(serde_json::Value),
}

impl<T> From<TryParse<T>> for Option<T> {
    fn from(value: TryParse<T>) -> Self {
        match value {
            TryParse::Parsed(v) => Some(v),
            TryParse::ParseFailed(_) => None,
        }
    }
}

/// Kind of a feature: which treatment family it produces.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// An experiment: hashes an identity field into one of several variants.
    RangeVariant,
    /// A fixed configured value with no bucketing.
    DynamicConfig,
}

/// The context field an experiment hashes to place a request into a variant.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BucketField {
    UserId,
    DeviceId,
    CanonicalUrl,
}

impl BucketField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketField::UserId => "user_id",
            BucketField::DeviceId => "device_id",
            BucketField::CanonicalUrl => "canonical_url",
        }
    }
}

impl std::fmt::Display for BucketField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type tag for a dynamic-config value, as spelled on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Boolean,
    Integer,
    Float,
    String,
    Map,
}

/// Typed value held by a dynamic-config feature.
///
/// # Serialization
///
/// Serialized as a two-field object with `type` and `value`. Type is one of "Boolean", "Integer",
/// "Float", "String", or "Map".
///
/// Example:
/// ```json
/// {"type":"Map","value":{"hello":"world"}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    /// A boolean value.
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A string value.
    String(Str),
    /// A structured JSON value.
    Map(Arc<serde_json::Value>),
}

impl Serialize for DynamicValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DynamicValue", 2)?;
        match self {
            DynamicValue::Boolean(b) => {
                state.serialize_field("type", "Boolean")?;
                state.serialize_field("value", b)?;
            }
            DynamicValue::Integer(i) => {
                state.serialize_field("type", "Integer")?;
                state.serialize_field("value", i)?;
            }
            DynamicValue::Float(n) => {
                state.serialize_field("type", "Float")?;
                state.serialize_field("value", n)?;
            }
            DynamicValue::String(s) => {
                state.serialize_field("type", "String")?;
                state.serialize_field("value", s)?;
            }
            DynamicValue::Map(m) => {
                state.serialize_field("type", "Map")?;
                state.serialize_field("value", m.as_ref())?;
            }
        }
        state.end()
    }
}

impl DynamicValue {
    /// Try to convert a raw configuration value to a `DynamicValue` under the given [`ValueType`].
    pub(crate) fn from_config_value(raw: &serde_json::Value, ty: ValueType) -> Option<DynamicValue> {
        Some(match ty {
            ValueType::Boolean => DynamicValue::Boolean(raw.as_bool()?),
            ValueType::Integer => DynamicValue::Integer(raw.as_i64()?),
            ValueType::Float => DynamicValue::Float(raw.as_f64()?),
            ValueType::String => DynamicValue::String(raw.as_str()?.into()),
            ValueType::Map => {
                if !raw.is_object() {
                    return None;
                }
                DynamicValue::Map(Arc::new(raw.clone()))
            }
        })
    }

    /// Checks if the value is of type Boolean.
    pub fn is_boolean(&self) -> bool {
        self.as_boolean().is_some()
    }
    /// Returns the value as a boolean if it is of type Boolean.
    ///
    /// # Examples
    /// ```
    /// # use decider_core::feature::DynamicValue;
    /// let value = DynamicValue::Boolean(true);
    /// assert_eq!(value.as_boolean(), Some(true));
    /// ```
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            DynamicValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Checks if the value is of type Integer.
    pub fn is_integer(&self) -> bool {
        self.as_integer().is_some()
    }
    /// Returns the value as an integer if it is of type Integer.
    ///
    /// # Examples
    /// ```
    /// # use decider_core::feature::DynamicValue;
    /// let value = DynamicValue::Integer(42);
    /// assert_eq!(value.as_integer(), Some(42));
    /// ```
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            DynamicValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Checks if the value is of type Float.
    pub fn is_float(&self) -> bool {
        self.as_float().is_some()
    }
    /// Returns the value as a float if it is of type Float.
    ///
    /// # Examples
    /// ```
    /// # use decider_core::feature::DynamicValue;
    /// let value = DynamicValue::Float(3.14);
    /// assert_eq!(value.as_float(), Some(3.14));
    /// ```
    pub fn as_float(&self) -> Option<f64> {
        match self {
            DynamicValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Checks if the value is of type String.
    pub fn is_string(&self) -> bool {
        self.as_str().is_some()
    }
    /// Returns the value as a string if it is of type String.
    ///
    /// # Examples
    /// ```
    /// # use decider_core::feature::DynamicValue;
    /// let value = DynamicValue::String("example".into());
    /// assert_eq!(value.as_str(), Some("example"));
    /// ```
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Checks if the value is of type Map.
    pub fn is_map(&self) -> bool {
        self.as_map().is_some()
    }
    /// Returns the value as a JSON value if it is of type Map.
    pub fn as_map(&self) -> Option<&serde_json::Value> {
        match self {
            DynamicValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the type tag of the value.
    pub fn value_type(&self) -> ValueType {
        match self {
            DynamicValue::Boolean(_) => ValueType::Boolean,
            DynamicValue::Integer(_) => ValueType::Integer,
            DynamicValue::Float(_) => ValueType::Float,
            DynamicValue::String(_) => ValueType::String,
            DynamicValue::Map(_) => ValueType::Map,
        }
    }
}

/// One possible experiment outcome, owning a sub-range of `[0, 1)`.
///
/// The range is half-open: a variant with `range_start == range_end` can never be selected, which
/// is how holdout slots are reserved.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[allow(missing_docs)]
pub struct Variant {
    pub name: Str,
    pub range_start: f64,
    pub range_end: f64,
}

impl Variant {
    pub(crate) fn contains(&self, position: f64) -> bool {
        self.range_start <= position && position < self.range_end
    }
}

/// Experiment payload of a range-variant feature.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Experiment {
    pub experiment_version: u32,
    pub shuffle_version: u32,
    pub bucket_val: BucketField,
    pub variants: Vec<Variant>,
    pub targeting: Option<TargetingRule>,
}

/// Payload of a feature, by kind.
#[derive(Debug, Clone)]
pub enum FeaturePayload {
    /// An experiment bucketing identities into variants.
    RangeVariant(Experiment),
    /// A fixed configured value.
    DynamicConfig(DynamicValue),
}

/// One named decision unit. Immutable once loaded.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub struct Feature {
    pub id: u64,
    pub name: Str,
    pub version: u64,
    pub enabled: bool,
    pub owner: Str,
    pub start_ts: i64,
    pub stop_ts: i64,
    pub emit_event: bool,
    pub payload: FeaturePayload,
}

impl Feature {
    /// Kind of this feature.
    pub fn kind(&self) -> FeatureKind {
        match self.payload {
            FeaturePayload::RangeVariant(_) => FeatureKind::RangeVariant,
            FeaturePayload::DynamicConfig(_) => FeatureKind::DynamicConfig,
        }
    }

    /// Whether `now` (epoch seconds) falls inside the feature's validity window.
    ///
    /// The window is half-open: active iff `start_ts <= now < stop_ts`.
    pub(crate) fn is_active(&self, now: i64) -> bool {
        self.start_ts <= now && now < self.stop_ts
    }
}

/// Feature definition as found on the wire, before validation.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub(crate) struct FeatureWire {
    pub id: u64,
    pub name: Str,
    pub enabled: bool,
    pub owner: Str,
    pub version: VersionWire,
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    pub start_ts: i64,
    pub stop_ts: i64,
    #[serde(default)]
    pub emit_event: bool,
    #[serde(default)]
    pub experiment: Option<ExperimentWire>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub value_type: Option<ValueType>,
}

/// Feature versions arrive as integers or numeric strings, depending on the age of the tool that
/// wrote the configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub(crate) enum VersionWire {
    Number(u64),
    String(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub(crate) struct ExperimentWire {
    pub variants: Vec<Variant>,
    pub experiment_version: u32,
    pub shuffle_version: u32,
    pub bucket_val: BucketField,
    /// Legacy emission flag still present in older configurations. Accepted but ignored;
    /// `emit_event` on the feature controls emission.
    #[serde(default)]
    #[allow(dead_code)]
    pub log_bucketing: bool,
    #[serde(default)]
    pub targeting: Option<TargetingRule>,
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum ValidationError {
    #[error("feature is keyed as \"{key}\" but named \"{name}\"")]
    NameMismatch { key: String, name: String },

    #[error("version \"{0}\" is not an integer")]
    InvalidVersion(String),

    #[error("range_variant feature has no experiment block")]
    MissingExperiment,

    #[error("dynamic_config feature has no value or value_type")]
    MissingValue,

    #[error("value does not match value_type {0:?}")]
    ValueTypeMismatch(ValueType),

    #[error("variant \"{name}\" has invalid range [{start}, {end})")]
    InvalidVariantRange { name: String, start: f64, end: f64 },

    #[error("validity window stops ({stop_ts}) before it starts ({start_ts})")]
    InvalidWindow { start_ts: i64, stop_ts: i64 },
}

impl FeatureWire {
    /// Validate the wire definition into the typed model.
    ///
    /// `key` is the name this definition was filed under in the configuration document; it must
    /// agree with the embedded name, since the map key is what lookups and the event trail use.
    pub(crate) fn validate(self, key: &str) -> Result<Feature, ValidationError> {
        if &*self.name != key {
            return Err(ValidationError::NameMismatch {
                key: key.to_owned(),
                name: self.name.to_string(),
            });
        }

        let version = match self.version {
            VersionWire::Number(n) => n,
            VersionWire::String(s) => s
                .parse()
                .map_err(|_| ValidationError::InvalidVersion(s))?,
        };

        if self.stop_ts < self.start_ts {
            return Err(ValidationError::InvalidWindow {
                start_ts: self.start_ts,
                stop_ts: self.stop_ts,
            });
        }

        let payload = match self.kind {
            FeatureKind::RangeVariant => {
                let experiment = self.experiment.ok_or(ValidationError::MissingExperiment)?;
                for variant in &experiment.variants {
                    let well_ordered = (0.0..=1.0).contains(&variant.range_start)
                        && (0.0..=1.0).contains(&variant.range_end)
                        && variant.range_start <= variant.range_end;
                    if !well_ordered {
                        return Err(ValidationError::InvalidVariantRange {
                            name: variant.name.to_string(),
                            start: variant.range_start,
                            end: variant.range_end,
                        });
                    }
                }
                FeaturePayload::RangeVariant(Experiment {
                    experiment_version: experiment.experiment_version,
                    shuffle_version: experiment.shuffle_version,
                    bucket_val: experiment.bucket_val,
                    variants: experiment.variants,
                    targeting: experiment.targeting,
                })
            }
            FeatureKind::DynamicConfig => {
                let (value, value_type) = self
                    .value
                    .as_ref()
                    .zip(self.value_type)
                    .ok_or(ValidationError::MissingValue)?;
                let value = DynamicValue::from_config_value(value, value_type)
                    .ok_or(ValidationError::ValueTypeMismatch(value_type))?;
                FeaturePayload::DynamicConfig(value)
            }
        };

        Ok(Feature {
            id: self.id,
            name: self.name,
            version,
            enabled: self.enabled,
            owner: self.owner,
            start_ts: self.start_ts,
            stop_ts: self.stop_ts,
            emit_event: self.emit_event,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(json: &str) -> FeatureWire {
        serde_json::from_str(json).unwrap()
    }

    const RANGE_VARIANT: &str = r#"
      {
        "id": 1,
        "name": "frontpage_ranking",
        "enabled": true,
        "owner": "growth",
        "version": "4",
        "type": "range_variant",
        "start_ts": 0,
        "stop_ts": 2147483647,
        "emit_event": true,
        "experiment": {
          "variants": [
            {"name": "control_1", "range_start": 0.0, "range_end": 0.2},
            {"name": "variant_2", "range_start": 0.2, "range_end": 0.4}
          ],
          "experiment_version": 1,
          "shuffle_version": 0,
          "bucket_val": "user_id",
          "log_bucketing": false
        }
      }
    "#;

    #[test]
    fn validates_range_variant() {
        let feature = wire(RANGE_VARIANT).validate("frontpage_ranking").unwrap();
        assert_eq!(feature.id, 1);
        assert_eq!(feature.version, 4);
        assert_eq!(feature.kind(), FeatureKind::RangeVariant);
        let FeaturePayload::RangeVariant(experiment) = &feature.payload else {
            panic!("expected experiment payload");
        };
        assert_eq!(experiment.bucket_val, BucketField::UserId);
        assert_eq!(experiment.variants.len(), 2);
    }

    #[test]
    fn validates_dynamic_config() {
        let feature = wire(
            r#"
              {
                "id": 7,
                "name": "max_comments",
                "enabled": true,
                "owner": "content",
                "version": 2,
                "type": "dynamic_config",
                "start_ts": 0,
                "stop_ts": 2147483647,
                "emit_event": false,
                "value": 500,
                "value_type": "Integer"
              }
            "#,
        )
        .validate("max_comments")
        .unwrap();
        let FeaturePayload::DynamicConfig(value) = &feature.payload else {
            panic!("expected dynamic config payload");
        };
        assert_eq!(value.as_integer(), Some(500));
    }

    #[test]
    fn rejects_name_mismatch() {
        let err = wire(RANGE_VARIANT).validate("other_name").unwrap_err();
        assert!(matches!(err, ValidationError::NameMismatch { .. }));
    }

    #[test]
    fn rejects_non_integer_version() {
        let mut w = wire(RANGE_VARIANT);
        w.version = VersionWire::String("four".to_owned());
        let err = w.validate("frontpage_ranking").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVersion(_)));
    }

    #[test]
    fn rejects_missing_experiment() {
        let mut w = wire(RANGE_VARIANT);
        w.experiment = None;
        let err = w.validate("frontpage_ranking").unwrap_err();
        assert!(matches!(err, ValidationError::MissingExperiment));
    }

    #[test]
    fn rejects_out_of_bounds_range() {
        let mut w = wire(RANGE_VARIANT);
        w.experiment.as_mut().unwrap().variants[0].range_end = 1.5;
        let err = w.validate("frontpage_ranking").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariantRange { .. }));
    }

    #[test]
    fn rejects_inverted_range() {
        let mut w = wire(RANGE_VARIANT);
        w.experiment.as_mut().unwrap().variants[0].range_start = 0.3;
        w.experiment.as_mut().unwrap().variants[0].range_end = 0.1;
        let err = w.validate("frontpage_ranking").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidVariantRange { .. }));
    }

    #[test]
    fn rejects_value_type_mismatch() {
        let err = wire(
            r#"
              {
                "id": 7,
                "name": "max_comments",
                "enabled": true,
                "owner": "content",
                "version": 2,
                "type": "dynamic_config",
                "start_ts": 0,
                "stop_ts": 2147483647,
                "value": "lots",
                "value_type": "Integer"
              }
            "#,
        )
        .validate("max_comments")
        .unwrap_err();
        assert!(matches!(err, ValidationError::ValueTypeMismatch(ValueType::Integer)));
    }

    #[test]
    fn string_id_fails_to_parse() {
        // id must be an integer, not a string; the entry is rescued as ParseFailed.
        let parsed: TryParse<FeatureWire> = serde_json::from_str(
            r#"{"id": "1", "name": "x", "enabled": true, "owner": "o", "version": 1,
                "type": "dynamic_config", "start_ts": 0, "stop_ts": 1,
                "value": true, "value_type": "Boolean"}"#,
        )
        .unwrap();
        assert!(matches!(parsed, TryParse::ParseFailed(_)));
    }

    #[test]
    fn zero_width_variant_contains_nothing() {
        let variant = Variant {
            name: "holdout".into(),
            range_start: 0.5,
            range_end: 0.5,
        };
        assert!(!variant.contains(0.5));
        assert!(!variant.contains(0.49999));
    }

    #[test]
    fn dynamic_value_serializes_tagged() {
        let value = DynamicValue::Boolean(true);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"type":"Boolean","value":true}"#
        );
    }
}
