//! Portable configuration document (export/import wire format).
//!
//! Export masks secrets and stamps the running format version. Import never
//! trusts the document: extension availability is checked exhaustively,
//! each extension's values are validated (masked secrets count as absent),
//! and referenced group ids are reconciled against what exists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::arguments::validate_extension_values;
use crate::configuration::{validate_fields, ConfigurationFields};
use crate::error::CoreError;
use crate::extension_spec::{ExtensionSpec, SpecLookup};
use crate::masking::{mask, strip_masked};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One extension inside a portable document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableExtension {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(default)]
    pub configurable_arguments: Option<Value>,
}

fn default_enabled() -> bool {
    true
}

/// A self-describing, versioned export of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableConfiguration {
    /// Version of the system that produced the document.
    pub format_version: String,
    pub exported_at: Timestamp,
    /// Id of the configuration on the exporting system. Informational only.
    #[serde(default)]
    pub origin_id: Option<DbId>,
    #[serde(flatten)]
    pub configuration: ConfigurationFields,
    #[serde(default)]
    pub extensions: Vec<PortableExtension>,
}

impl PortableConfiguration {
    /// Assemble an export, masking secrets of every registered extension.
    pub fn export<S: SpecLookup + ?Sized>(
        origin_id: DbId,
        configuration: ConfigurationFields,
        extensions: Vec<PortableExtension>,
        format_version: &str,
        exported_at: Timestamp,
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
            format_version: format_version.to_string(),
            exported_at,
            origin_id: Some(origin_id),
            configuration,
            extensions,
        }
    }
}

// ---------------------------------------------------------------------------
// Import planning
// ---------------------------------------------------------------------------

/// Everything needed to persist an imported configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    /// Field set to persist. Status is already mapped for import and
    /// `group_ids` holds only the groups that exist.
    pub configuration: ConfigurationFields,
    /// Extensions with masked placeholders stripped from their values.
    pub extensions: Vec<PortableExtension>,
    /// Non-fatal findings (version skew, dropped secrets, missing groups).
    pub warnings: Vec<String>,
}

/// Dry-run outcome of an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub is_valid: bool,
    pub format_version: String,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Outcome of matching referenced group ids against existing groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReconciliation {
    pub resolved: Vec<DbId>,
    pub missing: Vec<DbId>,
}

/// Validate a document and produce an [`ImportPlan`].
///
/// `existing_groups` must contain the subset of the document's group ids that
/// exist in the system. Fails on the first blocking problem, except that all
/// unavailable extension types are reported together.
pub fn plan_import<S: SpecLookup + ?Sized>(
    doc: &PortableConfiguration,
    specs: &S,
    running_version: &str,
    existing_groups: &[DbId],
) -> Result<ImportPlan, CoreError> {
    let mut warnings = Vec::new();
    warnings.extend(version_skew_warning(&doc.format_version, running_version));

    validate_fields(&doc.configuration)?;
    check_availability(&doc.extensions, specs)?;
    check_duplicate_extensions(&doc.extensions)?;

    let mut extensions = Vec::with_capacity(doc.extensions.len());
    for ext in &doc.extensions {
        let spec = specs.spec(&ext.name).ok_or_else(|| {
            CoreError::Internal(format!("Extension '{}' vanished from registry", ext.name))
        })?;
        let (prepared, dropped) = prepare_extension(ext, spec)?;
        warnings.extend(dropped);
        extensions.push(prepared);
    }

    let groups = reconcile_groups(&doc.configuration.group_ids, existing_groups)?;
    if !groups.missing.is_empty() {
        warnings.push(missing_groups_warning(&groups.missing));
    }

    let mut configuration = doc.configuration.clone();
    configuration.status = configuration.status.for_import();
    configuration.group_ids = groups.resolved;

    Ok(ImportPlan {
        configuration,
        extensions,
        warnings,
    })
}

/// Run every import check without stopping at the first failure.
pub fn assess_import<S: SpecLookup + ?Sized>(
    doc: &PortableConfiguration,
    specs: &S,
    running_version: &str,
    existing_groups: &[DbId],
) -> ImportReport {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    warnings.extend(version_skew_warning(&doc.format_version, running_version));

    if let Err(e) = validate_fields(&doc.configuration) {
        errors.push(e.to_string());
    }
    if let Err(e) = check_availability(&doc.extensions, specs) {
        errors.push(e.to_string());
    }
    if let Err(e) = check_duplicate_extensions(&doc.extensions) {
        errors.push(e.to_string());
    }
    for ext in &doc.extensions {
        let Some(spec) = specs.spec(&ext.name) else {
            continue;
        };
        match prepare_extension(ext, spec) {
            Ok((_, dropped)) => warnings.extend(dropped),
            Err(e) => errors.push(e.to_string()),
        }
    }
    match reconcile_groups(&doc.configuration.group_ids, existing_groups) {
        Ok(groups) if !groups.missing.is_empty() => {
            warnings.push(missing_groups_warning(&groups.missing))
        }
        Ok(_) => {}
        Err(e) => errors.push(e.to_string()),
    }

    ImportReport {
        is_valid: errors.is_empty(),
        format_version: doc.format_version.clone(),
        warnings,
        errors,
    }
}

/// Warning emitted when the document was produced by a different version.
pub fn version_skew_warning(document_version: &str, running_version: &str) -> Option<String> {
    (document_version != running_version).then(|| {
        format!(
            "Document format version {document_version} differs from running version \
             {running_version}; importing on a best-effort basis"
        )
    })
}

/// Fail with one error naming every extension type the registry cannot resolve.
pub fn check_availability<S: SpecLookup + ?Sized>(
    extensions: &[PortableExtension],
    specs: &S,
) -> Result<(), CoreError> {
    let mut seen = BTreeSet::new();
    let missing: Vec<&str> = extensions
        .iter()
        .map(|ext| ext.name.as_str())
        .filter(|name| specs.spec(name).is_none())
        .filter(|name| seen.insert(*name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unavailable extension types: {}",
            missing.join(", ")
        )))
    }
}

fn check_duplicate_extensions(extensions: &[PortableExtension]) -> Result<(), CoreError> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for ext in extensions {
        if !seen.insert(ext.name.as_str()) {
            duplicates.insert(ext.name.as_str());
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Extension types listed more than once: {}",
            duplicates.into_iter().collect::<Vec<_>>().join(", ")
        )))
    }
}

/// Strip masked placeholders and validate what remains.
///
/// Returns the cleaned extension and one warning per dropped secret.
fn prepare_extension(
    ext: &PortableExtension,
    spec: &ExtensionSpec,
) -> Result<(PortableExtension, Vec<String>), CoreError> {
    let stripped = strip_masked(&ext.values, &spec.arguments);
    let dropped: Vec<String> = stripped
        .dropped
        .iter()
        .map(|path| {
            format!(
                "Extension '{}': masked value for '{path}' was dropped and must be re-entered",
                ext.name
            )
        })
        .collect();

    let values = stripped.values;
    validate_extension_values(&values, spec)?;

    Ok((
        PortableExtension {
            name: ext.name.clone(),
            enabled: ext.enabled,
            values,
            configurable_arguments: ext.configurable_arguments.clone(),
        },
        dropped,
    ))
}

/// Match requested group ids against the ids that exist.
///
/// A document that names groups but resolves none of them is rejected: the
/// configuration would be orphaned from access control.
pub fn reconcile_groups(
    requested: &[DbId],
    existing: &[DbId],
) -> Result<GroupReconciliation, CoreError> {
    let mut seen = BTreeSet::new();
    let mut resolved = Vec::new();
    let mut missing = Vec::new();
    for id in requested.iter().copied().filter(|id| seen.insert(*id)) {
        if existing.contains(&id) {
            resolved.push(id);
        } else {
            missing.push(id);
        }
    }

    if !requested.is_empty() && resolved.is_empty() {
        return Err(CoreError::Validation(format!(
            "None of the referenced groups exist: {}",
            join_ids(&missing)
        )));
    }

    Ok(GroupReconciliation { resolved, missing })
}

fn missing_groups_warning(missing: &[DbId]) -> String {
    format!("Skipped groups that do not exist: {}", join_ids(missing))
}

fn join_ids(ids: &[DbId]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}
