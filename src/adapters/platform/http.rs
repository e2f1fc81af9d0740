//! HTTP client for the logistics platform API.
//!
//! Endpoints, relative to the configured base URL:
//! - `POST   /records/{entity}`          create
//! - `PATCH  /records/{entity}/{id}`     update
//! - `POST   /records/{entity}/query`    filtered read
//! - `POST   /artifacts`                 publish text or chart
//! - `GET    /plans?name=..`             plan lookup
//! - `POST   /plans/{id}/optimize`       optimization run, bearer user token
//!
//! Scope is sent as `user_id` / `empresa_id` on every record call.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Artifact, OptimizationResult, PlanId, Record, RecordQuery, RecordScope, ToolError, ToolsConfig,
};
use crate::domain::ports::{OptimizationEngine, PlanDirectory, RecordStore};

/// Platform API client.
#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ScopedBody<'a, T: Serialize> {
    user_id: &'a str,
    empresa_id: &'a str,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Serialize)]
struct FieldsBody {
    fields: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct ArtifactBody {
    artifact: Artifact,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlanResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct OptimizationResponse {
    total_duration_hours: f64,
    sequence_count: u32,
}

impl HttpPlatformClient {
    /// Client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::ValidationFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client for the configured platform, `None` when no base URL is set.
    pub fn from_config(config: &ToolsConfig) -> DomainResult<Option<Self>> {
        config
            .platform_base_url
            .as_deref()
            .map(|url| Self::new(url, Duration::from_secs(config.request_timeout_secs)))
            .transpose()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn scoped<'a, T: Serialize>(scope: &'a RecordScope, body: T) -> ScopedBody<'a, T> {
        ScopedBody {
            user_id: &scope.user_id,
            empresa_id: &scope.company_id,
            body,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ToolError> {
        let response = request
            .send()
            .await
            .map_err(|e| ToolError::Backend(format!("platform request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::Backend(format!("unexpected platform response: {e}")))
    }
}

fn map_status(status: StatusCode, body: String) -> ToolError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    };
    if status == StatusCode::NOT_FOUND {
        ToolError::NotFound(detail)
    } else if status.is_client_error() {
        ToolError::Rejected(detail)
    } else {
        ToolError::Backend(detail)
    }
}

#[async_trait]
impl RecordStore for HttpPlatformClient {
    async fn create(
        &self,
        scope: &RecordScope,
        entity: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ToolError> {
        let request = self
            .client
            .post(self.url(&format!("/records/{entity}")))
            .json(&Self::scoped(scope, FieldsBody { fields }));
        self.send(request).await
    }

    async fn update(
        &self,
        scope: &RecordScope,
        entity: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ToolError> {
        let request = self
            .client
            .patch(self.url(&format!("/records/{entity}/{id}")))
            .json(&Self::scoped(scope, FieldsBody { fields }));
        self.send(request).await
    }

    async fn query(
        &self,
        scope: &RecordScope,
        query: &RecordQuery,
    ) -> Result<Vec<Record>, ToolError> {
        let request = self
            .client
            .post(self.url(&format!("/records/{}/query", query.entity)))
            .json(&Self::scoped(scope, query));
        self.send(request).await
    }

    async fn publish(&self, scope: &RecordScope, artifact: Artifact) -> Result<String, ToolError> {
        let request = self
            .client
            .post(self.url("/artifacts"))
            .json(&Self::scoped(scope, ArtifactBody { artifact }));
        let response: PublishResponse = self.send(request).await?;
        Ok(response.id)
    }
}

#[async_trait]
impl PlanDirectory for HttpPlatformClient {
    async fn find_plan(&self, scope: &RecordScope, name: &str) -> Result<PlanId, ToolError> {
        let request = self.client.get(self.url("/plans")).query(&[
            ("name", name),
            ("user_id", scope.user_id.as_str()),
            ("empresa_id", scope.company_id.as_str()),
        ]);
        let response: PlanResponse = self.send(request).await?;
        Ok(PlanId(response.id))
    }
}

#[async_trait]
impl OptimizationEngine for HttpPlatformClient {
    async fn run(&self, plan_id: &PlanId, token: &str) -> Result<OptimizationResult, ToolError> {
        if token.trim().is_empty() {
            return Err(ToolError::Rejected("missing user token".to_string()));
        }
        let request = self
            .client
            .post(self.url(&format!("/plans/{plan_id}/optimize")))
            .bearer_auth(token);
        let response: OptimizationResponse = self.send(request).await?;
        Ok(OptimizationResult {
            plan_id: plan_id.clone(),
            total_duration_hours: response.total_duration_hours,
            sequence_count: response.sequence_count,
        })
    }
}
