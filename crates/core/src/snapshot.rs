//! Snapshot documents stored in configuration history.
//!
//! A snapshot freezes every externally-mutable field of a configuration plus
//! its extension instances. Secret argument values are masked before the
//! document is persisted, so history can never restore a secret.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::configuration::ConfigurationFields;
use crate::extension_spec::SpecLookup;
use crate::masking::mask;

/// Frozen state of one extension instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSnapshot {
    pub external_id: String,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub configurable_arguments: Option<Value>,
}

/// The payload of a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(flatten)]
    pub configuration: ConfigurationFields,
    #[serde(default)]
    pub extensions: Vec<ExtensionSnapshot>,
}

impl SnapshotDocument {
    /// Build a snapshot from live state, masking secrets of every extension
    /// whose type is still registered.
    ///
    /// Extensions whose type is no longer registered keep their values as-is:
    /// without a schema there is no way to tell which keys are secret. See
    /// [`SnapshotDocument::unregistered_extensions`].
    pub fn capture<S: SpecLookup + ?Sized>(
        configuration: ConfigurationFields,
        extensions: Vec<ExtensionSnapshot>,
        specs: &S,
    ) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|mut ext| {
                if let Some(spec) = specs.spec(&ext.name) {
                    ext.values = mask(&ext.values, &spec.arguments);
                }
                ext
            })
            .collect();

        Self {
            configuration,
            extensions,
        }
    }

    /// Names of extensions in this snapshot whose type `specs` cannot resolve.
    pub fn unregistered_extensions<'a, S: SpecLookup + ?Sized>(
        &'a self,
        specs: &S,
    ) -> Vec<&'a str> {
        self.extensions
            .iter()
            .filter(|ext| specs.spec(&ext.name).is_none())
            .map(|ext| ext.name.as_str())
            .collect()
    }
}
