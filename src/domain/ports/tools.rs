//! Tool layer ports
//!
//! `Tool` is what a specialist sees. The record, plan, and optimization traits
//! are the platform backends those tools call.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::models::{
    Artifact, OptimizationResult, PlanId, Record, RecordQuery, RecordScope, SessionContext,
    ToolError, ToolSpec,
};

/// Per-call context handed to tools.
///
/// Scope and credentials come from here, never from model arguments.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Session of the user the tool acts for
    pub session: SessionContext,
}

impl ToolContext {
    /// Context for `session`.
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    /// Record scope of the acting user and company.
    pub fn scope(&self) -> RecordScope {
        RecordScope {
            user_id: self.session.user_id.clone(),
            company_id: self.session.company_id.clone(),
        }
    }
}

/// A callable exposed to a specialist.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description, and input schema advertised to the model
    fn spec(&self) -> ToolSpec;

    /// Execute the tool and return an observation for the model.
    async fn call(&self, arguments: &Value, ctx: &ToolContext) -> Result<String, ToolError>;
}

/// Scoped record storage on the platform.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record within `scope`.
    async fn create(
        &self,
        scope: &RecordScope,
        entity: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ToolError>;

    /// Update a record within `scope`.
    async fn update(
        &self,
        scope: &RecordScope,
        entity: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ToolError>;

    /// Records within `scope` matching `query`.
    async fn query(&self, scope: &RecordScope, query: &RecordQuery)
        -> Result<Vec<Record>, ToolError>;

    /// Persist an artifact for the user; returns the artifact id.
    async fn publish(&self, scope: &RecordScope, artifact: Artifact) -> Result<String, ToolError>;
}

/// Plan-name to plan-ID lookup.
#[async_trait]
pub trait PlanDirectory: Send + Sync {
    /// Id of the plan named `name`.
    async fn find_plan(&self, scope: &RecordScope, name: &str) -> Result<PlanId, ToolError>;
}

/// Sequencing optimization engine.
#[async_trait]
pub trait OptimizationEngine: Send + Sync {
    /// Run the optimization of `plan_id` with the user's `token`.
    async fn run(&self, plan_id: &PlanId, token: &str) -> Result<OptimizationResult, ToolError>;
}
