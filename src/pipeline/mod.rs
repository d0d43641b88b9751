//! Trigger pipeline controller.

#[cfg(test)]
mod mod_test;

use std::sync::Arc;

use time::OffsetDateTime;

use crate::config::Config;
use crate::dataform::{CompilationResult, DataformApi, WorkflowInvocation};
use crate::error::{TriggerError, TriggerResult};
use crate::event::{self, PushEnvelope};
use crate::names;

/// A pipeline controller which drives one load-job trigger through the two dependent
/// Dataform operations.
///
/// Instances are stateless apart from the shared read-only config, so any number of pipeline
/// runs may be in flight concurrently without interacting.
pub struct PipelineCtl<C> {
    /// The application's runtime config.
    config: Arc<Config>,
    /// The client used to reach the Dataform API.
    client: C,
}

impl<C: DataformApi> PipelineCtl<C> {
    /// Create a new instance.
    pub fn new(config: Arc<Config>, client: C) -> Self {
        Self { config, client }
    }

    /// Run the full pipeline for the given trigger envelope.
    ///
    /// The reference instant is injected by the caller so that derived names are a pure function
    /// of the trigger's inputs.
    ///
    /// The two remote calls are strictly sequential: the invocation call only ever carries the
    /// compilation result name returned by the compilation call of the same run. A failure before
    /// or during the compilation call aborts the run with no invocation attempted; a failure of
    /// the invocation call leaves the already-created compilation artifact behind.
    #[tracing::instrument(level = "debug", skip(self, envelope, now))]
    pub async fn execute(&self, envelope: &PushEnvelope, now: OffsetDateTime) -> TriggerResult<WorkflowInvocation> {
        let table_id = event::destination_table_id(envelope)?;
        let names = names::derive(now, &table_id);
        tracing::info!(table_id = %table_id, compilation = %names.compilation, "processing load job completion");

        let parent = self.config.repository();
        let compilation = CompilationResult::for_load_job(&names, &table_id, self.config.workspace_path());
        let created = self.client.create_compilation_result(&parent, &compilation).await?;
        let compilation_name = created
            .name
            .ok_or(TriggerError::MalformedResponse("compilation result has no name"))?;
        tracing::debug!(compilation = %compilation_name, "compilation result created");

        let invocation = WorkflowInvocation::for_compilation(&names, compilation_name);
        let result = self.client.create_workflow_invocation(&parent, &invocation).await?;
        tracing::info!(invocation = %names.invocation, "workflow invocation created");
        Ok(result)
    }
}
