//! Recursive `!include` expansion for YAML manifests.
//!
//! An include is a mapping whose single key is `!include` with a string
//! value naming another YAML file, e.g. `{ "!include": "agents/db.yaml" }`.
//! The tag spelling `key: !include agents/db.yaml` is accepted as well.
//! The included document replaces the node holding the directive.
//! Relative paths resolve against the directory of the including file.

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use serde_yaml::value::TaggedValue;
use thiserror::Error;

use super::yaml_type_name;

/// Literal mapping key of the include directive.
pub const INCLUDE_KEY: &str = "!include";

/// Tag name of the `!include path` spelling.
const INCLUDE_TAG: &str = "include";

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("include error in {}: failed to read file", file.display())]
    Read {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("include error in {}: failed to parse YAML", file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("include error in {}: included file does not exist: {}", file.display(), target.display())]
    Missing { file: PathBuf, target: PathBuf },

    #[error("include error in {}: circular dependency on {}", file.display(), target.display())]
    Cycle { file: PathBuf, target: PathBuf },

    #[error("include error in {}: include path must be a string, found {found}", file.display())]
    NonStringPath { file: PathBuf, found: &'static str },

    #[error("include error in {}: '{INCLUDE_KEY}' must be the only key in its mapping", file.display())]
    MixedDirective { file: PathBuf },
}

impl IncludeError {
    /// File in which the failing directive (or parse failure) occurred.
    pub fn file(&self) -> &Path {
        match self {
            IncludeError::Read { file, .. }
            | IncludeError::Parse { file, .. }
            | IncludeError::Missing { file, .. }
            | IncludeError::Cycle { file, .. }
            | IncludeError::NonStringPath { file, .. }
            | IncludeError::MixedDirective { file } => file,
        }
    }
}

/// A fully expanded manifest tree.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    /// Expanded document; contains no include directive.
    pub root: Value,
    /// Every file loaded while expanding, root first, in load order.
    pub files: Vec<PathBuf>,
}

/// Read `path` and expand every include it transitively references.
///
/// Missing targets, parse failures, cycles and malformed directives are
/// fatal; no partial tree is returned.
pub fn resolve_manifest(path: &Path) -> Result<ResolvedManifest, IncludeError> {
    let root_path = path.canonicalize().map_err(|source| IncludeError::Read {
        file: path.to_path_buf(),
        source,
    })?;

    let mut resolver = IncludeResolver::default();
    let root = resolver.resolve_file(&root_path)?;

    Ok(ResolvedManifest {
        root,
        files: resolver.loaded,
    })
}

#[derive(Debug, Default)]
struct IncludeResolver {
    /// Canonical paths currently being expanded.
    stack: Vec<PathBuf>,
    loaded: Vec<PathBuf>,
}

impl IncludeResolver {
    fn resolve_file(&mut self, path: &Path) -> Result<Value, IncludeError> {
        let content = std::fs::read_to_string(path).map_err(|source| IncludeError::Read {
            file: path.to_path_buf(),
            source,
        })?;
        let document: Value =
            serde_yaml::from_str(&content).map_err(|source| IncludeError::Parse {
                file: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(file = %path.display(), depth = self.stack.len(), "expanding manifest file");
        if !self.loaded.iter().any(|p| p == path) {
            self.loaded.push(path.to_path_buf());
        }

        self.stack.push(path.to_path_buf());
        let expanded = self.expand(document, path);
        self.stack.pop();
        expanded
    }

    fn expand(&mut self, node: Value, current: &Path) -> Result<Value, IncludeError> {
        match node {
            Value::Mapping(mapping) => {
                if let Some(target) = mapping.get(INCLUDE_KEY) {
                    if mapping.len() != 1 {
                        return Err(IncludeError::MixedDirective {
                            file: current.to_path_buf(),
                        });
                    }
                    return self.include(target, current);
                }

                let mut expanded = serde_yaml::Mapping::with_capacity(mapping.len());
                for (key, value) in mapping {
                    let value = self.expand(value, current)?;
                    expanded.insert(key, value);
                }
                Ok(Value::Mapping(expanded))
            }
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.expand(item, current))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                if tag == INCLUDE_TAG {
                    return self.include(&value, current);
                }
                let value = self.expand(value, current)?;
                Ok(Value::Tagged(Box::new(TaggedValue { tag, value })))
            }
            scalar => Ok(scalar),
        }
    }

    fn include(&mut self, target: &Value, current: &Path) -> Result<Value, IncludeError> {
        let Value::String(raw) = target else {
            return Err(IncludeError::NonStringPath {
                file: current.to_path_buf(),
                found: yaml_type_name(target),
            });
        };

        let candidate = resolve_include_path(raw, current);
        if !candidate.exists() {
            return Err(IncludeError::Missing {
                file: current.to_path_buf(),
                target: candidate,
            });
        }
        let canonical = candidate
            .canonicalize()
            .map_err(|source| IncludeError::Read {
                file: candidate.clone(),
                source,
            })?;

        if self.stack.contains(&canonical) {
            return Err(IncludeError::Cycle {
                file: current.to_path_buf(),
                target: canonical,
            });
        }

        self.resolve_file(&canonical)
    }
}

/// Absolute paths are used as-is; relative ones join the including file's directory.
fn resolve_include_path(raw: &str, current: &Path) -> PathBuf {
    let raw_path = Path::new(raw);
    if raw_path.is_absolute() {
        return raw_path.to_path_buf();
    }
    current
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(raw_path)
}
