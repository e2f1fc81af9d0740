//! Tool layer models.
//!
//! The generic record tool accepts a typed command instead of executable text.
//! Commands are validated against an entity allow-list, and the user/company
//! scope is always taken from the session, never from model output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::errors::DomainError;

/// Field names reserved for scope; the model may not set them.
pub const SCOPE_FIELDS: &[&str] = &["user_id", "empresa_id", "company_id", "user", "empresa"];

/// Errors returned by tools and their backends.
///
/// These never abort a turn: the specialist runner turns them into observations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The command was malformed or not allowed
    #[error("command rejected: {0}")]
    Rejected(String),

    /// The named record or plan does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The external system failed
    #[error("backend error: {0}")]
    Backend(String),
}

impl ToolError {
    /// Attribute the error to `tool` at the domain level.
    pub fn for_tool(&self, tool: &str) -> DomainError {
        DomainError::ToolExecution {
            tool: tool.to_string(),
            message: self.to_string(),
        }
    }
}

/// Name, description, and JSON schema of a tool, as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Name the model uses to call the tool
    pub name: String,
    /// What the tool does, shown to the model
    pub description: String,
    /// JSON schema of the arguments
    pub input_schema: Value,
}

/// User/company scope applied to every record operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordScope {
    /// Acting user, from the session
    pub user_id: String,
    /// Acting company, from the session
    pub company_id: String,
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Platform-assigned id
    pub id: String,
    /// Entity type from the allow-list
    pub entity: String,
    /// Field values, scope fields included
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// Chart type of a published chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Bar chart
    Bar,
    /// Line chart
    Line,
    /// Pie chart
    Pie,
}

/// Chart artifact description, rendered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart type
    pub kind: ChartKind,
    /// Chart title shown to the user
    pub title: String,
    /// One label per value
    pub labels: Vec<String>,
    /// One value per label
    pub values: Vec<f64>,
}

impl ChartSpec {
    fn validate(&self) -> Result<(), ToolError> {
        if self.labels.is_empty() {
            return Err(ToolError::Rejected("chart has no data points".to_string()));
        }
        if self.labels.len() != self.values.len() {
            return Err(ToolError::Rejected(format!(
                "chart has {} labels but {} values",
                self.labels.len(),
                self.values.len()
            )));
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(ToolError::Rejected("chart values must be finite numbers".to_string()));
        }
        Ok(())
    }
}

/// Artifact delivered to the user through the platform side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// Formatted textual result
    Text { text: String },
    /// Generated chart
    Chart { chart: ChartSpec },
}

/// Read-only query over one entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Entity type to read
    pub entity: String,
    /// Equality filters on field values
    #[serde(default)]
    pub filters: Map<String, Value>,
    /// Projection; empty means all fields
    #[serde(default)]
    pub fields: Vec<String>,
    /// Maximum number of records returned
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A command for the generic record tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum RecordCommand {
    /// Create a record
    Create {
        /// Entity type from the allow-list
        entity: String,
        /// Field values; scope fields are rejected
        fields: Map<String, Value>,
    },
    /// Update an existing record by id
    Update {
        /// Entity type from the allow-list
        entity: String,
        /// Id of the record to change
        id: String,
        /// Fields to overwrite; scope fields are rejected
        fields: Map<String, Value>,
    },
    /// Read records of the acting user and company
    Query(RecordQuery),
    /// Publish a textual result to the user
    PublishText {
        /// Text shown to the user
        text: String,
    },
    /// Publish a chart to the user
    PublishChart {
        /// Chart shown to the user
        chart: ChartSpec,
    },
}

impl RecordCommand {
    /// Parse tool-call arguments into a command.
    pub fn from_arguments(arguments: &Value) -> Result<Self, ToolError> {
        serde_json::from_value(arguments.clone())
            .map_err(|e| ToolError::Rejected(format!("invalid command: {e}")))
    }

    /// Operation name as used in the command's `operation` field.
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Query(_) => "query",
            Self::PublishText { .. } => "publish_text",
            Self::PublishChart { .. } => "publish_chart",
        }
    }

    /// Check the command against the entity allow-list and the scope rules.
    pub fn validate(&self, allowed_entities: &[String]) -> Result<(), ToolError> {
        match self {
            Self::Create { entity, fields } => {
                check_entity(entity, allowed_entities)?;
                if fields.is_empty() {
                    return Err(ToolError::Rejected(
                        "create requires at least one field".to_string(),
                    ));
                }
                check_no_scope_fields(fields)
            }
            Self::Update { entity, id, fields } => {
                check_entity(entity, allowed_entities)?;
                if id.trim().is_empty() {
                    return Err(ToolError::Rejected("update requires a record id".to_string()));
                }
                if fields.is_empty() {
                    return Err(ToolError::Rejected(
                        "update requires at least one field".to_string(),
                    ));
                }
                check_no_scope_fields(fields)
            }
            Self::Query(query) => {
                check_entity(&query.entity, allowed_entities)?;
                check_no_scope_fields(&query.filters)
            }
            Self::PublishText { text } => {
                if text.trim().is_empty() {
                    return Err(ToolError::Rejected("published text is empty".to_string()));
                }
                Ok(())
            }
            Self::PublishChart { chart } => chart.validate(),
        }
    }
}

fn check_entity(entity: &str, allowed: &[String]) -> Result<(), ToolError> {
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(entity)) {
        Ok(())
    } else {
        Err(ToolError::Rejected(format!("entity '{entity}' is not allowed")))
    }
}

fn check_no_scope_fields(fields: &Map<String, Value>) -> Result<(), ToolError> {
    match fields
        .keys()
        .find(|k| SCOPE_FIELDS.iter().any(|s| s.eq_ignore_ascii_case(k)))
    {
        Some(key) => Err(ToolError::Rejected(format!(
            "field '{key}' is set from the session and cannot be supplied"
        ))),
        None => Ok(()),
    }
}

/// Identifier of a logistics plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub String);

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a sequencing optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Plan that was optimized
    pub plan_id: PlanId,
    /// Total duration of the optimized plan
    pub total_duration_hours: f64,
    /// Number of generated sequences
    pub sequence_count: u32,
}
