//! Automation export files and the import naming policy.
//!
//! Export wraps a workflow's stored steps in a versioned document.  Import
//! checks only that `version` and `name` are present and that `steps` is an
//! array; the steps themselves are taken as they are.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransferError;

/// Format version written into every export.
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
    pub original_id: String,
}

/// The downloadable `<slug>_automation.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<Value>,
    pub metadata: ExportMetadata,
}

impl ExportDocument {
    /// Build an export from a stored workflow.  A non-array `steps` value
    /// exports as an empty list.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        steps: &Value,
        metadata: ExportMetadata,
    ) -> Self {
        Self {
            version: EXPORT_FORMAT_VERSION.to_owned(),
            name: name.into(),
            description,
            steps: steps.as_array().cloned().unwrap_or_default(),
            metadata,
        }
    }

    /// File name offered for download.
    pub fn file_name(&self) -> String {
        export_file_name(&self.name)
    }
}

/// The parts of an import document that are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDocument {
    pub version: String,
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<Value>,
}

/// `"Lead Intake v2"` → `"lead_intake_v2_automation.json"`
pub fn export_file_name(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{slug}_automation.json")
}

/// Parse and check an uploaded import file.
pub fn parse_import(raw: &str) -> Result<ImportDocument, TransferError> {
    let value: Value = serde_json::from_str(raw)?;
    read_import(&value)
}

/// Check an already-decoded import document.
pub fn read_import(value: &Value) -> Result<ImportDocument, TransferError> {
    let object = value.as_object().ok_or(TransferError::NotAnObject)?;

    let version = required_str(object.get("version"), "version")?;
    let name = required_str(object.get("name"), "name")?;
    let steps = match object.get("steps") {
        Some(Value::Array(steps)) => steps.clone(),
        Some(_) => return Err(TransferError::StepsNotSequence),
        None => return Err(TransferError::MissingField { field: "steps" }),
    };
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_owned);

    Ok(ImportDocument {
        version,
        name,
        description,
        steps,
    })
}

fn required_str(value: Option<&Value>, field: &'static str) -> Result<String, TransferError> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
        .ok_or(TransferError::MissingField { field })
}

/// Pick a name that does not clash with `existing`:
/// `name`, then `name (Copy)`, then `name (Copy 2)`, `name (Copy 3)`, …
pub fn unique_import_name<'a, I>(name: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: std::collections::HashSet<&str> = existing.into_iter().collect();
    if !taken.contains(name) {
        return name.to_owned();
    }

    let first_copy = format!("{name} (Copy)");
    if !taken.contains(first_copy.as_str()) {
        return first_copy;
    }

    (2u32..)
        .map(|n| format!("{name} (Copy {n})"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or(first_copy)
}
