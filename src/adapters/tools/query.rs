//! Generic record tool used by Helper and Analytics.
//!
//! Accepts a typed [`RecordCommand`]; nothing the model sends is executed.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::models::{Artifact, Record, RecordCommand, ToolError, ToolSpec};
use crate::domain::models::role::QUERY_TOOL;
use crate::domain::ports::{RecordStore, Tool, ToolContext};

/// Create, update, query, and publish through the platform record store.
pub struct QueryTool {
    store: Arc<dyn RecordStore>,
    allowed_entities: Vec<String>,
    read_only: bool,
}

impl QueryTool {
    /// Query tool limited to `allowed_entities`.
    pub fn new(store: Arc<dyn RecordStore>, allowed_entities: Vec<String>) -> Self {
        Self {
            store,
            allowed_entities,
            read_only: false,
        }
    }

    /// Refuse `create` and `update`; queries and publishing stay allowed.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

fn describe_records(entity: &str, records: &[Record]) -> Result<String, ToolError> {
    if records.is_empty() {
        return Ok(format!("Nenhum registro de {entity} encontrado."));
    }
    let rows = serde_json::to_string(records)
        .map_err(|e| ToolError::Backend(format!("failed to encode records: {e}")))?;
    Ok(format!("{} registro(s) de {entity}: {rows}", records.len()))
}

#[async_trait]
impl Tool for QueryTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: QUERY_TOOL.to_string(),
            description: format!(
                "Executa uma operação sobre os registros da plataforma. Entidades permitidas: {}. \
                 O usuário e a empresa são aplicados automaticamente.",
                self.allowed_entities.join(", ")
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": ["create", "update", "query", "publish_text", "publish_chart"]
                    },
                    "entity": {"type": "string", "enum": self.allowed_entities},
                    "id": {"type": "string", "description": "Record id (update only)"},
                    "fields": {
                        "description": "Field values for create/update, or projection names for query"
                    },
                    "filters": {"type": "object", "description": "Equality filters (query only)"},
                    "limit": {"type": "integer", "minimum": 1},
                    "text": {"type": "string", "description": "Text to publish"},
                    "chart": {
                        "type": "object",
                        "properties": {
                            "kind": {"type": "string", "enum": ["bar", "line", "pie"]},
                            "title": {"type": "string"},
                            "labels": {"type": "array", "items": {"type": "string"}},
                            "values": {"type": "array", "items": {"type": "number"}}
                        },
                        "required": ["kind", "title", "labels", "values"]
                    }
                },
                "required": ["operation"]
            }),
        }
    }

    async fn call(&self, arguments: &Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let command = RecordCommand::from_arguments(arguments)?;
        command.validate(&self.allowed_entities)?;
        if self.read_only
            && matches!(
                command,
                RecordCommand::Create { .. } | RecordCommand::Update { .. }
            )
        {
            return Err(ToolError::Rejected(format!(
                "operation '{}' is not available to this agent",
                command.operation()
            )));
        }
        let scope = ctx.scope();

        tracing::debug!(operation = command.operation(), "running record command");

        match command {
            RecordCommand::Create { entity, fields } => {
                let record = self.store.create(&scope, &entity, fields).await?;
                Ok(format!(
                    "Registro de {} criado com sucesso (id {}).",
                    record.entity, record.id
                ))
            }
            RecordCommand::Update { entity, id, fields } => {
                let record = self.store.update(&scope, &entity, &id, fields).await?;
                Ok(format!(
                    "Registro de {} atualizado com sucesso (id {}).",
                    record.entity, record.id
                ))
            }
            RecordCommand::Query(query) => {
                let records = self.store.query(&scope, &query).await?;
                describe_records(&query.entity, &records)
            }
            RecordCommand::PublishText { text } => {
                let id = self.store.publish(&scope, Artifact::Text { text }).await?;
                Ok(format!("Texto publicado para o usuário (artefato {id})."))
            }
            RecordCommand::PublishChart { chart } => {
                let title = chart.title.clone();
                let id = self.store.publish(&scope, Artifact::Chart { chart }).await?;
                Ok(format!("Gráfico \"{title}\" publicado para o usuário (artefato {id})."))
            }
        }
    }
}
