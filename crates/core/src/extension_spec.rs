//! Extension argument schemas and the static extension registry.
//!
//! An extension type declares its arguments as a map of [`ArgumentSpec`]s.
//! The shape of each argument is the closed sum type [`ArgumentKind`], so the
//! masking codec and the argument validator can recurse over it exhaustively.
//!
//! The registry is read-only at runtime. It is loaded once at startup from a
//! JSON array of [`ExtensionSpec`] documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `format` tag marking an argument value as secret.
pub const SECRET_FORMAT: &str = "password";

// ---------------------------------------------------------------------------
// Schema types
// ---------------------------------------------------------------------------

/// Descriptor of a single extension argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: ArgumentKind,
}

/// Type-specific part of an argument descriptor, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArgumentKind {
    String {
        #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
        allowed: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<ArgumentPattern>,
        #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    Boolean,
    Object {
        #[serde(default)]
        properties: BTreeMap<String, ArgumentSpec>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<ArgumentSpec>>,
    },
}

impl ArgumentSpec {
    /// Whether values of this argument must never leave the system in clear.
    pub fn is_secret(&self) -> bool {
        self.format.as_deref() == Some(SECRET_FORMAT)
    }

    /// The `type` tag as written in the schema.
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl ArgumentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgumentKind::String { .. } => "string",
            ArgumentKind::Number { .. } => "number",
            ArgumentKind::Integer { .. } => "integer",
            ArgumentKind::Boolean => "boolean",
            ArgumentKind::Object { .. } => "object",
            ArgumentKind::Array { .. } => "array",
        }
    }
}

/// A string `pattern` constraint, compiled when the schema is parsed.
///
/// Serializes back to the source text, and two patterns compare equal when
/// their source text does.
#[derive(Debug, Clone)]
pub struct ArgumentPattern(Regex);

impl ArgumentPattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

impl PartialEq for ArgumentPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for ArgumentPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ArgumentPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(|e| {
            serde::de::Error::custom(format!("invalid pattern '{source}': {e}"))
        })
    }
}

/// Declarative schema of one extension type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: BTreeMap<String, ArgumentSpec>,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Resolve an extension type name to its schema.
pub trait SpecLookup {
    fn spec(&self, name: &str) -> Option<&ExtensionSpec>;
}

/// Errors raised while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read extension specs from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed extension specs: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Extension spec name must not be empty")]
    EmptyName,

    #[error("Duplicate extension spec '{0}'")]
    DuplicateName(String),
}

/// Name-keyed collection of extension specs.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    specs: BTreeMap<String, ExtensionSpec>,
}

impl ExtensionRegistry {
    /// Build a registry, rejecting empty or duplicate names. Argument
    /// patterns were already compiled when the specs were parsed.
    pub fn new(specs: Vec<ExtensionSpec>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if map.contains_key(&spec.name) {
                return Err(RegistryError::DuplicateName(spec.name));
            }
            map.insert(spec.name.clone(), spec);
        }
        Ok(Self { specs: map })
    }

    /// Parse a JSON array of extension specs.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let specs: Vec<ExtensionSpec> = serde_json::from_str(json)?;
        Self::new(specs)
    }

    /// Read and parse a JSON array of extension specs from disk.
    pub fn load_from_path(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// All registered specs, ordered by name.
    pub fn list(&self) -> Vec<&ExtensionSpec> {
        self.specs.values().collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl SpecLookup for ExtensionRegistry {
    fn spec(&self, name: &str) -> Option<&ExtensionSpec> {
        self.specs.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SPECS: &str = r#"[
        {
            "name": "rag-tool",
            "description": "Retrieval over a document index",
            "arguments": {
                "apiKey": { "type": "string", "format": "password", "required": true },
                "endpoint": { "type": "string", "pattern": "^https?://" },
                "topK": { "type": "integer", "minimum": 1, "maximum": 50 },
                "options": {
                    "type": "object",
                    "properties": {
                        "temperature": { "type": "number", "minimum": 0, "maximum": 2 },
                        "mode": { "type": "string", "enum": ["fast", "accurate"] }
                    }
                }
            }
        },
        { "name": "calculator" }
    ]"#;

    #[test]
    fn parses_nested_argument_schema() {
        let registry = ExtensionRegistry::from_json_str(SPECS).unwrap();
        assert_eq!(registry.len(), 2);

        let rag = registry.spec("rag-tool").unwrap();
        let api_key = &rag.arguments["apiKey"];
        assert!(api_key.required);
        assert!(api_key.is_secret());
        assert_eq!(api_key.type_name(), "string");

        assert_matches!(
            rag.arguments["topK"].kind,
            ArgumentKind::Integer {
                minimum: Some(1),
                maximum: Some(50)
            }
        );

        let ArgumentKind::Object { properties } = &rag.arguments["options"].kind else {
            panic!("options should be an object argument");
        };
        assert_matches!(
            &properties["mode"].kind,
            ArgumentKind::String { allowed: Some(values), .. } if values.len() == 2
        );
        assert!(!properties["temperature"].required);
    }

    #[test]
    fn spec_without_arguments_is_allowed() {
        let registry = ExtensionRegistry::from_json_str(SPECS).unwrap();
        assert!(registry.spec("calculator").unwrap().arguments.is_empty());
        assert!(registry.spec("missing").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let json = r#"[{ "name": "a" }, { "name": "a" }]"#;
        assert_matches!(
            ExtensionRegistry::from_json_str(json),
            Err(RegistryError::DuplicateName(name)) if name == "a"
        );
    }

    #[test]
    fn empty_name_rejected() {
        assert_matches!(
            ExtensionRegistry::from_json_str(r#"[{ "name": " " }]"#),
            Err(RegistryError::EmptyName)
        );
    }

    #[test]
    fn invalid_nested_pattern_rejected() {
        let json = r#"[{
            "name": "bad",
            "arguments": {
                "outer": {
                    "type": "object",
                    "properties": { "inner": { "type": "string", "pattern": "([" } }
                }
            }
        }]"#;
        assert_matches!(
            ExtensionRegistry::from_json_str(json),
            Err(RegistryError::Parse(e)) if e.to_string().contains("invalid pattern '(['")
        );
    }

    #[test]
    fn pattern_round_trips_as_source_text() {
        let registry = ExtensionRegistry::from_json_str(SPECS).unwrap();
        let endpoint = &registry.spec("rag-tool").unwrap().arguments["endpoint"];
        let ArgumentKind::String {
            pattern: Some(pattern),
            ..
        } = &endpoint.kind
        else {
            panic!("endpoint should carry a pattern");
        };
        assert!(pattern.is_match("https://x"));
        assert!(!pattern.is_match("ftp://x"));

        let json = serde_json::to_value(endpoint).unwrap();
        assert_eq!(json["pattern"], "^https?://");
        let back: ArgumentSpec = serde_json::from_value(json).unwrap();
        assert_eq!(&back, endpoint);
    }

    #[test]
    fn unknown_type_tag_is_a_parse_error() {
        let json = r#"[{ "name": "x", "arguments": { "a": { "type": "date" } } }]"#;
        assert_matches!(
            ExtensionRegistry::from_json_str(json),
            Err(RegistryError::Parse(_))
        );
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specs.json");
        std::fs::write(&path, SPECS).unwrap();

        let registry = ExtensionRegistry::load_from_path(&path).unwrap();
        assert_eq!(
            registry.list().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["calculator", "rag-tool"]
        );

        assert_matches!(
            ExtensionRegistry::load_from_path(&dir.path().join("nope.json")),
            Err(RegistryError::Io { .. })
        );
    }
}
