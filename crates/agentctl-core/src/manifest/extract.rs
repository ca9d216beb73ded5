//! Projection of a validated tree into typed specs.

use serde::de::DeserializeOwned;
use serde_yaml::Value;
use thiserror::Error;

use super::Manifest;
use super::path::FieldPath;
use super::yaml_type_name;
use crate::spec::{AgentSpec, AgentSystemSpec, McpServerSpec};
use crate::types::ResourceKind;

/// A tree that passed validation did not have the shape extraction expects.
#[derive(Debug, Error)]
#[error("internal error: {field}: {message}")]
pub struct ExtractError {
    pub field: String,
    pub message: String,
}

impl ExtractError {
    fn new(field: &FieldPath, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

trait SectionEntry: DeserializeOwned {
    fn set_index(&mut self, index: usize);
}

impl SectionEntry for McpServerSpec {
    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl SectionEntry for AgentSpec {
    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl SectionEntry for AgentSystemSpec {
    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

/// Build the typed manifest from a tree that passed validation.
pub fn extract_manifest(root: &Value) -> Result<Manifest, ExtractError> {
    let Value::Mapping(mapping) = root else {
        return Err(ExtractError::new(
            &FieldPath::root(),
            format!("expected a mapping, found {}", yaml_type_name(root)),
        ));
    };

    let mut manifest = Manifest::default();
    for kind in ResourceKind::ALL {
        let Some(section) = mapping.get(kind.section()) else {
            continue;
        };
        manifest.sections.push(kind);
        match kind {
            ResourceKind::McpServer => manifest.mcp_servers = extract_section(kind, section)?,
            ResourceKind::Agent => manifest.agents = extract_section(kind, section)?,
            ResourceKind::AgentSystem => manifest.agent_systems = extract_section(kind, section)?,
        }
    }
    Ok(manifest)
}

fn extract_section<T: SectionEntry>(
    kind: ResourceKind,
    section: &Value,
) -> Result<Vec<T>, ExtractError> {
    let path = FieldPath::root().key(kind.section());
    let Value::Sequence(items) = section else {
        return Err(ExtractError::new(
            &path,
            format!("expected a sequence, found {}", yaml_type_name(section)),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let mut spec: T = serde_yaml::from_value(item.clone())
                .map_err(|e| ExtractError::new(&path.index(index), e.to_string()))?;
            spec.set_index(index);
            Ok(spec)
        })
        .collect()
}
