use std::sync::Arc;

use chrono::Utc;

use crate::bucketer::Md5Bucketer;
use crate::configuration_store::ConfigurationStore;
use crate::{Configuration, Context, Result};

use super::{choose, Decision};

/// The externally visible entry point of the engine.
///
/// `Decider` wraps the pure [`choose`] function and supplies its dependencies: the current
/// configuration snapshot (from an injected [`ConfigurationStore`]) and the clock. Every
/// instance is independently configured; there is no process-global state, so multiple deciders
/// with different configurations can coexist in one process.
pub struct Decider {
    configuration_store: Arc<ConfigurationStore>,
    bucketer: Md5Bucketer,
}

impl Decider {
    /// Create a decider reading snapshots from the given store.
    ///
    /// The store may be shared with a writer that picks up new feature definitions; the decider
    /// sees each published snapshot atomically.
    pub fn new(configuration_store: Arc<ConfigurationStore>) -> Decider {
        Decider {
            configuration_store,
            bucketer: Md5Bucketer,
        }
    }

    /// Create a decider over a single fixed configuration.
    pub fn from_configuration(configuration: Configuration) -> Decider {
        let store = ConfigurationStore::new();
        store.set_configuration(Arc::new(configuration));
        Decider::new(Arc::new(store))
    }

    /// Decide the treatment for `feature_name` under the given context.
    pub fn choose(&self, feature_name: &str, context: &Context) -> Result<Decision> {
        let configuration = self.configuration_store.get_configuration();
        choose(
            configuration.as_deref(),
            feature_name,
            context,
            &self.bucketer,
            Utc::now().timestamp(),
        )
    }
}
