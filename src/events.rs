//! Bucketing event formatting.
//!
//! A successful bucketing emits one audit string that downstream analysis joins assignments on.
//! The engine returns event strings to the caller instead of logging them itself; what storage
//! they land in is the host's concern.

use crate::feature::{Experiment, Feature, Variant};

/// Separator between the fields of a bucketing event string. Field order and separator are a wire
/// contract shared with the analysis pipeline.
pub const EVENT_FIELD_SEPARATOR: &str = "::::";

/// Tag identifying the bucketing type of the event.
const BUCKETING_EVENT_TYPE: &str = "experiment";

/// Format the audit record for a successful bucketing.
///
/// Fields, in order: bucketing-type tag, feature id, feature name, feature version, variant name,
/// the identifier that was hashed, the `bucket_val` field name, window start, window stop, owner.
pub fn format_bucketing_event(
    feature: &Feature,
    experiment: &Experiment,
    identifier: &str,
    variant: &Variant,
) -> String {
    format!(
        "{tag}{s}{id}{s}{name}{s}{version}{s}{variant}{s}{identifier}{s}{bucket_val}{s}{start_ts}{s}{stop_ts}{s}{owner}",
        s = EVENT_FIELD_SEPARATOR,
        tag = BUCKETING_EVENT_TYPE,
        id = feature.id,
        name = feature.name,
        version = feature.version,
        variant = variant.name,
        bucket_val = experiment.bucket_val,
        start_ts = feature.start_ts,
        stop_ts = feature.stop_ts,
        owner = feature.owner,
    )
}

/// Event strings for a bucketing outcome: exactly one when the feature wants events and a variant
/// was assigned, zero otherwise.
pub(crate) fn bucketing_events(
    feature: &Feature,
    experiment: &Experiment,
    identifier: &str,
    variant: Option<&Variant>,
) -> Vec<String> {
    match variant {
        Some(variant) if feature.emit_event => {
            vec![format_bucketing_event(feature, experiment, identifier, variant)]
        }
        _ => Vec::new(),
    }
}
