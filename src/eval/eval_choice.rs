use serde::Serialize;

use crate::bucketer::Bucketer;
use crate::events::bucketing_events;
use crate::feature::{DynamicValue, Experiment, Feature, FeaturePayload, Variant};
use crate::{Configuration, Context, Error, Result, Str};

/// Result of a decision: which treatment the caller should apply.
///
/// Exactly one of `variant` and `value` is populated for a successful assignment; both are `None`
/// when the caller was excluded by targeting or fell into no variant's range. Those two outcomes
/// are deliberately indistinguishable here.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Id of the feature the decision is for.
    pub feature_id: u64,
    /// Name of the feature the decision is for.
    pub feature_name: Str,
    /// Version of the feature the decision is for.
    pub feature_version: u64,
    /// Assigned variant name, if the feature is an experiment and a variant was assigned.
    pub variant: Option<Str>,
    /// Configured value, if the feature is a dynamic config.
    pub value: Option<DynamicValue>,
    /// Audit strings to hand to the analytics pipeline. Zero or one entries.
    pub events: Vec<String>,
}

impl Decision {
    fn unassigned(feature: &Feature) -> Decision {
        Decision {
            feature_id: feature.id,
            feature_name: feature.name.clone(),
            feature_version: feature.version,
            variant: None,
            value: None,
            events: Vec::new(),
        }
    }

    fn dynamic_config(feature: &Feature, value: DynamicValue) -> Decision {
        Decision {
            value: Some(value),
            ..Decision::unassigned(feature)
        }
    }

    fn assigned(feature: &Feature, variant: &Variant, events: Vec<String>) -> Decision {
        Decision {
            variant: Some(variant.name.clone()),
            events,
            ..Decision::unassigned(feature)
        }
    }
}

/// Decide the treatment for `feature_name` under the given context.
///
/// Pure and non-blocking: the outcome is fully determined by the configuration snapshot, the
/// context, and `now` (epoch seconds, used only for the validity-window check). Use
/// [`Decider`](super::Decider) to have the snapshot and clock supplied automatically.
pub fn choose(
    configuration: Option<&Configuration>,
    feature_name: &str,
    context: &Context,
    bucketer: &impl Bucketer,
    now: i64,
) -> Result<Decision> {
    let Some(configuration) = configuration else {
        log::warn!(target: "decider",
                   feature_name;
                   "choosing a treatment before any configuration has been loaded");
        return Err(Error::FeatureNotFound {
            feature_name: feature_name.to_owned(),
        });
    };

    let Some(feature) = configuration.get(feature_name) else {
        return Err(Error::FeatureNotFound {
            feature_name: feature_name.to_owned(),
        });
    };

    if !feature.enabled {
        log::trace!(target: "decider", feature_name; "feature is disabled");
        return Err(Error::FeatureNotFound {
            feature_name: feature_name.to_owned(),
        });
    }

    if !feature.is_active(now) {
        log::trace!(target: "decider", feature_name; "feature is outside its validity window");
        return Err(Error::FeatureNotFound {
            feature_name: feature_name.to_owned(),
        });
    }

    let result = feature.decide(context, bucketer);

    match &result {
        Ok(decision) => {
            log::trace!(target: "decider",
                        feature_name,
                        variant:serde = decision.variant;
                        "made a decision");
        }
        Err(err) => {
            log::warn!(target: "decider",
                       feature_name;
                       "error occurred while deciding: {err}");
        }
    }

    result
}

impl Feature {
    fn decide(&self, context: &Context, bucketer: &impl Bucketer) -> Result<Decision> {
        match &self.payload {
            FeaturePayload::DynamicConfig(value) => {
                Ok(Decision::dynamic_config(self, value.clone()))
            }
            FeaturePayload::RangeVariant(experiment) => experiment.decide(self, context, bucketer),
        }
    }
}

impl Experiment {
    fn decide(
        &self,
        feature: &Feature,
        context: &Context,
        bucketer: &impl Bucketer,
    ) -> Result<Decision> {
        let Some(identifier) = context.bucketing_field(self.bucket_val) else {
            return Err(Error::MissingContextField {
                field: self.bucket_val,
            });
        };

        let targeted = self
            .targeting
            .as_ref()
            .map_or(true, |rule| rule.eval(&context.other_fields));
        if !targeted {
            return Ok(Decision::unassigned(feature));
        }

        let variant = self.assign(feature, identifier, bucketer);
        let events = bucketing_events(feature, self, identifier, variant);
        Ok(match variant {
            Some(variant) => Decision::assigned(feature, variant, events),
            None => Decision::unassigned(feature),
        })
    }
}
