//! Optimizer tools: plan lookup and optimization run.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::models::role::{OPTIMIZATION_TOOL, PLAN_LOOKUP_TOOL};
use crate::domain::models::{PlanId, ToolError, ToolSpec};
use crate::domain::ports::{OptimizationEngine, PlanDirectory, Tool, ToolContext};

#[derive(Debug, Deserialize)]
struct PlanLookupArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OptimizationArgs {
    plan_id: String,
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: &Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| ToolError::Rejected(format!("invalid arguments: {e}")))
}

/// Resolves a plan name to its ID.
pub struct PlanLookupTool {
    plans: Arc<dyn PlanDirectory>,
}

impl PlanLookupTool {
    /// Plan lookup tool.
    pub fn new(plans: Arc<dyn PlanDirectory>) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl Tool for PlanLookupTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: PLAN_LOOKUP_TOOL.to_string(),
            description: "Obtém o ID de um plano de carregamento/descarregamento a partir do nome."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"name": {"type": "string", "description": "Nome do plano"}},
                "required": ["name"]
            }),
        }
    }

    async fn call(&self, arguments: &Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let args: PlanLookupArgs = parse_args(arguments)?;
        if args.name.trim().is_empty() {
            return Err(ToolError::Rejected("plan name is empty".to_string()));
        }
        let id = self.plans.find_plan(&ctx.scope(), args.name.trim()).await?;
        Ok(json!({"plan_id": id, "name": args.name.trim()}).to_string())
    }
}

/// Runs the sequencing optimization for a plan with the session's token.
pub struct OptimizationTool {
    engine: Arc<dyn OptimizationEngine>,
}

impl OptimizationTool {
    /// Sequencing tool.
    pub fn new(engine: Arc<dyn OptimizationEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for OptimizationTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: OPTIMIZATION_TOOL.to_string(),
            description: "Executa a otimização de sequenciamento de um plano. \
                          O token do usuário é aplicado automaticamente."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"plan_id": {"type": "string", "description": "ID do plano"}},
                "required": ["plan_id"]
            }),
        }
    }

    async fn call(&self, arguments: &Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let args: OptimizationArgs = parse_args(arguments)?;
        let plan_id = PlanId(args.plan_id.trim().to_string());
        if plan_id.0.is_empty() {
            return Err(ToolError::Rejected("plan id is empty".to_string()));
        }

        let result = self.engine.run(&plan_id, &ctx.session.token).await?;
        Ok(format!(
            "Otimização concluída para o plano {}: duração total de {} horas, {} sequências geradas.",
            result.plan_id,
            format_hours(result.total_duration_hours),
            result.sequence_count
        ))
    }
}

/// Hours with at most two decimals, trailing zeros dropped.
fn format_hours(hours: f64) -> String {
    let text = format!("{hours:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
