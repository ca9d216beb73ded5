//! Structural validation of an expanded manifest tree.
//!
//! Validation is total: every violation in the document is reported, in
//! document order, each with the field path it was found at. Cross-resource
//! references are not checked here; they need the remote catalogs.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::name::check_name;
use super::path::FieldPath;
use super::yaml_type_name;
use crate::types::ResourceKind;

pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Offending values longer than this are cut in error output.
const MAX_VALUE_PREVIEW: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: FieldPath,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(value) = &self.value {
            write!(f, " (got {value:?})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate an expanded manifest against the resource schemas.
pub fn validate_manifest(root: &Value) -> ValidationReport {
    let mut validator = Validator::default();
    validator.document(root);
    tracing::debug!(errors = validator.errors.len(), "manifest validated");
    ValidationReport {
        errors: validator.errors,
    }
}

type FieldCheck = fn(&mut Validator, &Value, &FieldPath);

struct FieldRule {
    key: &'static str,
    required: bool,
    check: FieldCheck,
}

impl FieldRule {
    const fn required(key: &'static str, check: FieldCheck) -> Self {
        Self {
            key,
            required: true,
            check,
        }
    }

    const fn optional(key: &'static str, check: FieldCheck) -> Self {
        Self {
            key,
            required: false,
            check,
        }
    }
}

const MCP_SERVER_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", Validator::name),
    FieldRule::optional("description", Validator::description),
    FieldRule::optional("options", Validator::options),
];

const AGENT_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", Validator::name),
    FieldRule::optional("description", Validator::description),
    FieldRule::required("llm_options", Validator::llm_options),
    FieldRule::optional("options", Validator::options),
    FieldRule::optional("mcp_servers", Validator::mcp_server_refs),
];

const AGENT_SYSTEM_FIELDS: &[FieldRule] = &[
    FieldRule::required("name", Validator::name),
    FieldRule::optional("description", Validator::description),
    FieldRule::required("agents", Validator::agent_refs),
    FieldRule::optional("options", Validator::options),
];

fn fields_for(kind: ResourceKind) -> &'static [FieldRule] {
    match kind {
        ResourceKind::McpServer => MCP_SERVER_FIELDS,
        ResourceKind::Agent => AGENT_FIELDS,
        ResourceKind::AgentSystem => AGENT_SYSTEM_FIELDS,
    }
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn push(&mut self, field: &FieldPath, message: impl Into<String>, value: Option<&Value>) {
        self.errors.push(ValidationError {
            field: field.clone(),
            message: message.into(),
            value: value.and_then(preview),
        });
    }

    fn document(&mut self, root: &Value) {
        let path = FieldPath::root();
        let Value::Mapping(mapping) = root else {
            self.push(
                &path,
                format!("configuration must be a mapping, found {}", yaml_type_name(root)),
                None,
            );
            return;
        };

        for (key, value) in mapping {
            let Value::String(key) = key else {
                self.push(&path, "top-level keys must be strings", Some(key));
                continue;
            };
            match ResourceKind::from_section(key) {
                Some(kind) => self.section(kind, value, &path.key(key.as_str())),
                None => self.push(
                    &path.key(key.as_str()),
                    "unknown top-level key; expected one of mcp-servers, agents, agent-systems",
                    None,
                ),
            }
        }
    }

    fn section(&mut self, kind: ResourceKind, value: &Value, path: &FieldPath) {
        let Value::Sequence(items) = value else {
            self.push(
                path,
                format!("must be a sequence, found {}", yaml_type_name(value)),
                None,
            );
            return;
        };

        let declared = declared_names(items);
        for (index, item) in items.iter().enumerate() {
            let item_path = path.index(index);
            match item {
                Value::Mapping(spec) => self.spec(kind, spec, &item_path, path, &declared),
                other => self.push(
                    &item_path,
                    format!("{} must be a mapping, found {}", kind.label(), yaml_type_name(other)),
                    None,
                ),
            }
        }
    }

    fn spec(
        &mut self,
        kind: ResourceKind,
        spec: &Mapping,
        path: &FieldPath,
        section_path: &FieldPath,
        declared: &HashMap<&str, Vec<usize>>,
    ) {
        let rules = fields_for(kind);

        for (key, value) in spec {
            let Value::String(key) = key else {
                self.push(path, "field names must be strings", Some(key));
                continue;
            };
            let field_path = path.key(key.as_str());
            let Some(rule) = rules.iter().find(|rule| rule.key == key) else {
                self.push(&field_path, format!("unknown field for {}", kind.label()), None);
                continue;
            };
            if value.is_null() {
                if rule.required {
                    self.push(&field_path, "is required", None);
                }
                continue;
            }
            (rule.check)(self, value, &field_path);

            if rule.key == "name" {
                if let Value::String(name) = value {
                    self.duplicate(name, path, section_path, declared);
                }
            }
        }

        for rule in rules.iter().filter(|rule| rule.required) {
            if !spec.contains_key(rule.key) {
                self.push(&path.key(rule.key), "is required", None);
            }
        }
    }

    fn duplicate(
        &mut self,
        name: &str,
        path: &FieldPath,
        section_path: &FieldPath,
        declared: &HashMap<&str, Vec<usize>>,
    ) {
        let Some(indices) = declared.get(name) else {
            return;
        };
        if indices.len() < 2 {
            return;
        }
        let own = path.segments().last();
        let others: Vec<String> = indices
            .iter()
            .map(|&index| section_path.index(index))
            .filter(|other| other.segments().last() != own)
            .map(|other| other.key("name").to_string())
            .collect();
        self.push(
            &path.key("name"),
            format!("duplicate name '{name}' (also declared at {})", others.join(", ")),
            None,
        );
    }

    fn name(&mut self, value: &Value, path: &FieldPath) {
        let Some(name) = self.string(value, path) else {
            return;
        };
        if let Err(violation) = check_name(name) {
            self.push(path, violation.message(), Some(value));
        }
    }

    fn description(&mut self, value: &Value, path: &FieldPath) {
        let Some(description) = self.string(value, path) else {
            return;
        };
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            self.push(
                path,
                format!("must be at most {MAX_DESCRIPTION_LEN} characters, got {len}"),
                Some(value),
            );
        }
    }

    fn options(&mut self, value: &Value, path: &FieldPath) {
        let Some(options) = self.mapping(value, path) else {
            return;
        };
        for key in options.keys() {
            if !key.is_string() {
                self.push(path, "option keys must be strings", Some(key));
            }
        }
    }

    fn llm_options(&mut self, value: &Value, path: &FieldPath) {
        let Some(llm) = self.mapping(value, path) else {
            return;
        };
        let provider_path = path.key("provider");
        match llm.get("provider") {
            None | Some(Value::Null) => self.push(&provider_path, "is required", None),
            Some(Value::String(provider)) if provider.trim().is_empty() => {
                self.push(&provider_path, "must not be empty", None);
            }
            Some(Value::String(_)) => {}
            Some(other) => self.push(
                &provider_path,
                format!("must be a string, found {}", yaml_type_name(other)),
                Some(other),
            ),
        }
    }

    fn mcp_server_refs(&mut self, value: &Value, path: &FieldPath) {
        self.reference_list(value, path, false);
    }

    fn agent_refs(&mut self, value: &Value, path: &FieldPath) {
        self.reference_list(value, path, true);
    }

    fn reference_list(&mut self, value: &Value, path: &FieldPath, require_one: bool) {
        let Value::Sequence(items) = value else {
            self.push(
                path,
                format!("must be a sequence of names, found {}", yaml_type_name(value)),
                None,
            );
            return;
        };
        if require_one && items.is_empty() {
            self.push(path, "must contain at least one name", None);
            return;
        }
        for (index, item) in items.iter().enumerate() {
            let item_path = path.index(index);
            if let Some(reference) = self.string(item, &item_path) {
                if reference.is_empty() {
                    self.push(&item_path, "must not be empty", None);
                }
            }
        }
    }

    fn string<'v>(&mut self, value: &'v Value, path: &FieldPath) -> Option<&'v str> {
        match value {
            Value::String(s) => Some(s),
            other => {
                self.push(
                    path,
                    format!("must be a string, found {}", yaml_type_name(other)),
                    Some(other),
                );
                None
            }
        }
    }

    fn mapping<'v>(&mut self, value: &'v Value, path: &FieldPath) -> Option<&'v Mapping> {
        match value {
            Value::Mapping(mapping) => Some(mapping),
            other => {
                self.push(
                    path,
                    format!("must be a mapping, found {}", yaml_type_name(other)),
                    Some(other),
                );
                None
            }
        }
    }
}

/// Index list per string name, for uniqueness checks within one section.
fn declared_names(items: &[Value]) -> HashMap<&str, Vec<usize>> {
    let mut declared: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        if let Some(Value::String(name)) = item.get("name") {
            declared.entry(name.as_str()).or_default().push(index);
        }
    }
    declared
}

fn preview(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if rendered.chars().count() <= MAX_VALUE_PREVIEW {
        return Some(rendered);
    }
    let cut: String = rendered.chars().take(MAX_VALUE_PREVIEW).collect();
    Some(format!("{cut}..."))
}
