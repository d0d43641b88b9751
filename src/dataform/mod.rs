//! Dataform API client.

mod models;

pub use models::{CodeCompilationConfig, CompilationResult, InvocationConfig, WorkflowInvocation, VAR_GA4_TABLE};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{TriggerError, TriggerResult};

/// The default base URL of the Dataform API.
const DEFAULT_BASE_URL: &str = "https://dataform.googleapis.com";

/// The two Dataform operations used by the trigger pipeline.
///
/// The API is treated as an opaque collaborator; implementations only need to perform the calls
/// and surface rejections unmodified.
#[async_trait]
pub trait DataformApi: Send + Sync {
    /// Create a compilation result under the given repository.
    async fn create_compilation_result(&self, parent: &str, compilation_result: &CompilationResult) -> TriggerResult<CompilationResult>;

    /// Create a workflow invocation under the given repository.
    async fn create_workflow_invocation(&self, parent: &str, workflow_invocation: &WorkflowInvocation) -> TriggerResult<WorkflowInvocation>;
}

/// A REST client for the Dataform `v1beta1` API.
pub struct DataformClient {
    /// The underlying HTTP client.
    http: reqwest::Client,
    /// The base URL of the API.
    base_url: String,
}

impl DataformClient {
    /// Create a new client instance targeting the Google endpoint.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the base URL of the API, used to point the client at a test server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// POST the given body as JSON and decode the response body.
    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(&self, url: String, body: &B) -> TriggerResult<T> {
        let response = self.http.post(&url).json(body).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(TriggerError::Remote { status, message });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DataformApi for DataformClient {
    async fn create_compilation_result(&self, parent: &str, compilation_result: &CompilationResult) -> TriggerResult<CompilationResult> {
        let url = format!("{}/v1beta1/{}/compilationResults", self.base_url, parent);
        self.post_json(url, compilation_result).await
    }

    async fn create_workflow_invocation(&self, parent: &str, workflow_invocation: &WorkflowInvocation) -> TriggerResult<WorkflowInvocation> {
        let url = format!("{}/v1beta1/{}/workflowInvocations", self.base_url, parent);
        self.post_json(url, workflow_invocation).await
    }
}
