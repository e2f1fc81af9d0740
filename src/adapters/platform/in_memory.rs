//! In-memory platform backend for tests and offline demos.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::models::{
    Artifact, OptimizationResult, PlanId, Record, RecordQuery, RecordScope, ToolError,
};
use crate::domain::ports::{OptimizationEngine, PlanDirectory, RecordStore};

#[derive(Debug, Clone)]
struct ScopedRecord {
    scope: RecordScope,
    record: Record,
}

/// Record store, plan directory, and optimization engine kept in memory.
///
/// Records and artifacts are partitioned by scope. Plans and optimization
/// results are seeded with the builder methods.
#[derive(Clone, Default)]
pub struct InMemoryPlatform {
    records: Arc<RwLock<Vec<ScopedRecord>>>,
    artifacts: Arc<RwLock<Vec<(RecordScope, Artifact)>>>,
    plans: Arc<RwLock<HashMap<String, PlanId>>>,
    results: Arc<RwLock<HashMap<PlanId, OptimizationResult>>>,
    optimization_failure: Arc<RwLock<Option<String>>>,
}

impl InMemoryPlatform {
    /// Empty platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plan and the result its optimization returns.
    pub async fn add_plan(
        &self,
        name: &str,
        id: &str,
        total_duration_hours: f64,
        sequence_count: u32,
    ) {
        let plan_id = PlanId(id.to_string());
        self.plans
            .write()
            .await
            .insert(name.trim().to_lowercase(), plan_id.clone());
        self.results.write().await.insert(
            plan_id.clone(),
            OptimizationResult {
                plan_id,
                total_duration_hours,
                sequence_count,
            },
        );
    }

    /// Make every optimization run fail with `message`.
    pub async fn fail_optimizations(&self, message: impl Into<String>) {
        *self.optimization_failure.write().await = Some(message.into());
    }

    /// Artifacts published under `scope`.
    pub async fn artifacts_for(&self, scope: &RecordScope) -> Vec<Artifact> {
        self.artifacts
            .read()
            .await
            .iter()
            .filter(|(s, _)| s == scope)
            .map(|(_, a)| a.clone())
            .collect()
    }

    /// Records stored under `scope`.
    pub async fn records_for(&self, scope: &RecordScope) -> Vec<Record> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| &r.scope == scope)
            .map(|r| r.record.clone())
            .collect()
    }
}

fn matches_filters(record: &Record, filters: &Map<String, Value>) -> bool {
    filters
        .iter()
        .all(|(key, expected)| record.fields.get(key) == Some(expected))
}

fn project(record: &Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return record.clone();
    }
    Record {
        id: record.id.clone(),
        entity: record.entity.clone(),
        fields: record
            .fields
            .iter()
            .filter(|(k, _)| fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

#[async_trait]
impl RecordStore for InMemoryPlatform {
    async fn create(
        &self,
        scope: &RecordScope,
        entity: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ToolError> {
        let record = Record {
            id: uuid::Uuid::new_v4().to_string(),
            entity: entity.to_lowercase(),
            fields,
        };
        self.records.write().await.push(ScopedRecord {
            scope: scope.clone(),
            record: record.clone(),
        });
        Ok(record)
    }

    async fn update(
        &self,
        scope: &RecordScope,
        entity: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ToolError> {
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|r| {
                &r.scope == scope && r.record.id == id && r.record.entity.eq_ignore_ascii_case(entity)
            })
            .ok_or_else(|| ToolError::NotFound(format!("{entity} {id}")))?;
        stored.record.fields.extend(fields);
        Ok(stored.record.clone())
    }

    async fn query(
        &self,
        scope: &RecordScope,
        query: &RecordQuery,
    ) -> Result<Vec<Record>, ToolError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| &r.scope == scope)
            .filter(|r| r.record.entity.eq_ignore_ascii_case(&query.entity))
            .filter(|r| matches_filters(&r.record, &query.filters))
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|r| project(&r.record, &query.fields))
            .collect())
    }

    async fn publish(&self, scope: &RecordScope, artifact: Artifact) -> Result<String, ToolError> {
        let mut artifacts = self.artifacts.write().await;
        artifacts.push((scope.clone(), artifact));
        Ok(format!("artifact-{}", artifacts.len()))
    }
}

#[async_trait]
impl PlanDirectory for InMemoryPlatform {
    async fn find_plan(&self, _scope: &RecordScope, name: &str) -> Result<PlanId, ToolError> {
        self.plans
            .read()
            .await
            .get(&name.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| ToolError::NotFound(format!("plan '{name}'")))
    }
}

#[async_trait]
impl OptimizationEngine for InMemoryPlatform {
    async fn run(&self, plan_id: &PlanId, token: &str) -> Result<OptimizationResult, ToolError> {
        if token.trim().is_empty() {
            return Err(ToolError::Rejected("missing user token".to_string()));
        }
        if let Some(message) = self.optimization_failure.read().await.clone() {
            return Err(ToolError::Backend(message));
        }
        self.results
            .read()
            .await
            .get(plan_id)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(format!("plan id {plan_id}")))
    }
}
