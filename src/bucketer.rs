//! Bucketer implementation: stable hash to a position in `[0, 1)` and variant assignment.
use md5;

use crate::feature::{Experiment, Feature, Variant};

/// Separator for the fields of the hash input. An ASCII unit separator cannot legally appear in
/// identifiers, feature names, or version numbers, so distinct inputs never collide by
/// concatenation.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Maps an opaque byte string to a position in `[0, 1)`.
///
/// The mapping is a wire-level contract: identical input must yield the identical position across
/// processes, architectures, and restarts, forever. Changing the hash for a feature with live
/// assignments reassigns its entire population.
pub trait Bucketer {
    fn position(&self, input: impl AsRef<[u8]>) -> f64;
}

/// The default (and only) bucketer.
pub struct Md5Bucketer;

impl Bucketer for Md5Bucketer {
    fn position(&self, input: impl AsRef<[u8]>) -> f64 {
        let hash = md5::compute(input);
        let value = u64::from_be_bytes(hash[0..8].try_into().unwrap());
        // Top 53 bits over 2^53: every position is exactly representable in f64.
        (value >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl Experiment {
    /// Deterministically assign `identifier` to one of the experiment's variants.
    ///
    /// Variants are scanned in declaration order; the first one whose half-open
    /// `[range_start, range_end)` contains the hashed position wins. Returns `None` when no
    /// variant's range contains the position (gaps, or zero-width holdout slots).
    pub(crate) fn assign<'a>(
        &'a self,
        feature: &Feature,
        identifier: &str,
        bucketer: &impl Bucketer,
    ) -> Option<&'a Variant> {
        let position = bucketer.position(self.bucketing_input(feature, identifier));
        self.variants.iter().find(|variant| variant.contains(position))
    }

    /// Build the hash input: identifier, feature name, feature id, experiment version, shuffle
    /// version, in that order. Bumping either version re-randomizes assignment without renaming
    /// the feature.
    fn bucketing_input(&self, feature: &Feature, identifier: &str) -> String {
        format!(
            "{identifier}{sep}{name}{sep}{id}{sep}{experiment_version}{sep}{shuffle_version}",
            sep = FIELD_SEPARATOR,
            name = feature.name,
            id = feature.id,
            experiment_version = self.experiment_version,
            shuffle_version = self.shuffle_version,
        )
    }
}
