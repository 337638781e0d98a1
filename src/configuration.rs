use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::feature::{Feature, FeatureWire, TryParse};
use crate::{Error, Result};

/// An immutable snapshot of validated feature definitions.
///
/// `Configuration` is built once from raw bytes and never mutated; reconfiguration means building
/// a new snapshot and swapping it into the
/// [`ConfigurationStore`](crate::configuration_store::ConfigurationStore). Loading is pure over
/// the input bytes, so two processes fed the same document hold identical snapshots.
#[derive(Debug)]
pub struct Configuration {
    /// Timestamp when the snapshot was built.
    pub loaded_at: DateTime<Utc>,
    features: HashMap<String, Feature>,
    load_report: LoadReport,
}

/// Per-feature load failures collected while building a [`Configuration`].
///
/// A failed definition never aborts the load; it is dropped, and the features that validated stay
/// usable (partial-load tolerance). Callers that prefer fail-fast construction can check
/// [`LoadReport::ok`].
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// The rejected definitions, in no particular order.
    pub failures: Vec<LoadFailure>,
}

/// One rejected feature definition.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    /// Name the definition was keyed under.
    pub feature_name: String,
    /// Human-readable reason for the rejection.
    pub reason: String,
}

impl LoadReport {
    /// Number of rejected definitions.
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// `Err(Error::Initialization)` if anything failed to load, `Ok(())` otherwise.
    ///
    /// The snapshot the report came from remains usable either way.
    pub fn ok(&self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Initialization {
                failed_count: self.failures.len(),
            })
        }
    }
}

impl Configuration {
    /// Parse and validate a raw configuration document: a JSON object keyed by feature name.
    ///
    /// Fails only when the document itself cannot be decoded. Individual malformed or invalid
    /// feature definitions are dropped, logged, and recorded in the [`LoadReport`].
    pub fn from_json(json: &[u8]) -> Result<Configuration> {
        let wire: HashMap<String, TryParse<FeatureWire>> = serde_json::from_slice(json)?;

        let mut features = HashMap::with_capacity(wire.len());
        let mut failures = Vec::new();
        for (name, entry) in wire {
            match entry {
                TryParse::Parsed(definition) => match definition.validate(&name) {
                    Ok(feature) => {
                        features.insert(name, feature);
                    }
                    Err(err) => {
                        log::warn!(target: "decider",
                                   feature_name = name.as_str();
                                   "dropping invalid feature definition: {err}");
                        failures.push(LoadFailure {
                            feature_name: name,
                            reason: err.to_string(),
                        });
                    }
                },
                TryParse::ParseFailed(_raw) => {
                    log::warn!(target: "decider",
                               feature_name = name.as_str();
                               "dropping unparseable feature definition");
                    failures.push(LoadFailure {
                        feature_name: name,
                        reason: "unparseable feature definition".to_owned(),
                    });
                }
            }
        }

        Ok(Configuration {
            loaded_at: Utc::now(),
            features,
            load_report: LoadReport { failures },
        })
    }

    /// Build a configuration from already-validated features. Useful for tests and for hosts that
    /// assemble definitions programmatically.
    pub fn from_features(features: impl IntoIterator<Item = Feature>) -> Configuration {
        Configuration {
            loaded_at: Utc::now(),
            features: features
                .into_iter()
                .map(|feature| (feature.name.to_string(), feature))
                .collect(),
            load_report: LoadReport::default(),
        }
    }

    /// Look up a feature by name.
    pub fn get(&self, feature_name: &str) -> Option<&Feature> {
        self.features.get(feature_name)
    }

    /// Names of all loaded features. Note that this may include disabled features and features
    /// outside their validity window.
    pub fn feature_names(&self) -> HashSet<String> {
        self.features.keys().cloned().collect()
    }

    /// Report of definitions dropped during the load.
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }
}

#[cfg(test)]
mod tests {
    use super::Configuration;
    use crate::Error;

    const MIXED: &str = r#"
      {
        "good_config": {
          "id": 10,
          "name": "good_config",
          "enabled": true,
          "owner": "infra",
          "version": 1,
          "type": "dynamic_config",
          "start_ts": 0,
          "stop_ts": 2147483647,
          "value": true,
          "value_type": "Boolean"
        },
        "bad_ranges": {
          "id": 11,
          "name": "bad_ranges",
          "enabled": true,
          "owner": "infra",
          "version": 1,
          "type": "range_variant",
          "start_ts": 0,
          "stop_ts": 2147483647,
          "experiment": {
            "variants": [{"name": "all", "range_start": 0.0, "range_end": 2.0}],
            "experiment_version": 1,
            "shuffle_version": 0,
            "bucket_val": "user_id"
          }
        },
        "not_even_a_feature": 42
      }
    "#;

    #[test]
    fn loads_partially() {
        let _ = env_logger::builder().is_test(true).try_init();

        let configuration = Configuration::from_json(MIXED.as_bytes()).unwrap();

        assert!(configuration.get("good_config").is_some());
        assert!(configuration.get("bad_ranges").is_none());
        assert!(configuration.get("not_even_a_feature").is_none());
        assert_eq!(configuration.load_report().failed_count(), 2);
    }

    #[test]
    fn load_report_converts_to_initialization_error() {
        let configuration = Configuration::from_json(MIXED.as_bytes()).unwrap();
        let err = configuration.load_report().ok().unwrap_err();
        assert!(matches!(err, Error::Initialization { failed_count: 2 }));
        // The valid feature is still usable despite the error.
        assert!(configuration.get("good_config").is_some());
    }

    #[test]
    fn clean_load_reports_ok() {
        let configuration = Configuration::from_json(br#"{}"#).unwrap();
        assert!(configuration.load_report().ok().is_ok());
        assert!(configuration.feature_names().is_empty());
    }

    #[test]
    fn undecodable_document_is_a_parse_error() {
        let err = Configuration::from_json(b"not json").unwrap_err();
        assert!(matches!(err, Error::ConfigurationParse(_)));
    }

    #[test]
    fn key_name_mismatch_is_dropped() {
        let configuration = Configuration::from_json(
            br#"
              {
                "keyed_name": {
                  "id": 1,
                  "name": "embedded_name",
                  "enabled": true,
                  "owner": "infra",
                  "version": 1,
                  "type": "dynamic_config",
                  "start_ts": 0,
                  "stop_ts": 2147483647,
                  "value": 1,
                  "value_type": "Integer"
                }
              }
            "#,
        )
        .unwrap();
        assert!(configuration.get("keyed_name").is_none());
        assert_eq!(configuration.load_report().failed_count(), 1);
    }
}
