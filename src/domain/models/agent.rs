use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::prompt::ComposedPrompt;
use super::role::SpecialistRole;

/// Static definition of a specialist: role, tools, and construction-time prompt.
///
/// The model binding and tool handles live in the service layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDefinition {
    /// Role the agent plays
    pub role: SpecialistRole,

    /// Unique name within the team (e.g. "helper", "`data_analytics`")
    pub role_name: String,

    /// Tools the specialist may call
    pub tool_names: Vec<String>,

    /// Prompt composed at construction time from the empty query
    pub system_prompt: ComposedPrompt,

    /// When the agent was built
    pub created_at: DateTime<Utc>,
}

impl AgentDefinition {
    /// Definition for `role` with its standard tool set.
    pub fn new(role: SpecialistRole, system_prompt: ComposedPrompt) -> Self {
        Self {
            role,
            role_name: role.agent_name().to_string(),
            tool_names: role.tool_names().iter().map(ToString::to_string).collect(),
            system_prompt,
            created_at: Utc::now(),
        }
    }
}

/// How a specialist turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The model produced a final answer
    Completed,
    /// The iteration cap was reached first
    BudgetExceeded,
    /// The turn deadline passed first
    DeadlineExceeded,
    /// The model call itself failed
    ModelFailed,
}

impl TurnStatus {
    /// Whether the turn ended without a final answer.
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::BudgetExceeded => write!(f, "budget_exceeded"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::ModelFailed => write!(f, "model_failed"),
        }
    }
}

impl FromStr for TurnStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "budget_exceeded" => Ok(Self::BudgetExceeded),
            "deadline_exceeded" => Ok(Self::DeadlineExceeded),
            "model_failed" => Ok(Self::ModelFailed),
            _ => Err(anyhow::anyhow!("Invalid turn status: {s}")),
        }
    }
}

/// Record of one tool invocation during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolTrace {
    /// Tool name as called by the model
    pub tool: String,
    /// The `operation` argument, for tools that take one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Whether the call returned an observation without error
    pub succeeded: bool,
    /// Observation returned to the model (error text on failure)
    pub observation: String,
}

/// Result of one specialist turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistOutcome {
    /// Role of the specialist that ran
    pub role: SpecialistRole,
    /// How the turn ended
    pub status: TurnStatus,
    /// Final text; on failure, an explicit failure description
    pub text: String,
    /// Number of model calls made
    pub iterations: u32,
    /// Every tool call of the turn, in order
    pub tool_calls: Vec<ToolTrace>,
}

impl SpecialistOutcome {
    /// Tool failures observed during the turn.
    pub fn failed_tools(&self) -> impl Iterator<Item = &ToolTrace> {
        self.tool_calls.iter().filter(|t| !t.succeeded)
    }

    /// Whether a text or chart artifact was published for the user.
    pub fn published_artifact(&self) -> bool {
        self.tool_calls.iter().any(|t| {
            t.succeeded
                && t.operation
                    .as_deref()
                    .is_some_and(|op| op.starts_with("publish_"))
        })
    }
}
