use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use time::{Date, Month, OffsetDateTime};

use super::*;
use crate::dataform::{CompilationResult, DataformApi, WorkflowInvocation, VAR_GA4_TABLE};
use crate::fixtures;

const COMPILATION_NAME: &str = "projects/my-project/locations/europe-west1/repositories/analytics/compilationResults/4f6e1c2a";

/// A Dataform API double which records calls and serves canned responses.
#[derive(Clone, Default)]
struct MockApi {
    calls: Arc<MockCalls>,
    /// Reject the compilation call instead of creating the artifact.
    fail_compilation: bool,
    /// Return a compilation result without a name.
    omit_compilation_name: bool,
}

#[derive(Default)]
struct MockCalls {
    compilations: AtomicUsize,
    invocations: AtomicUsize,
    last_compilation: Mutex<Option<(String, CompilationResult)>>,
    last_invocation: Mutex<Option<(String, WorkflowInvocation)>>,
}

#[async_trait]
impl DataformApi for MockApi {
    async fn create_compilation_result(&self, parent: &str, compilation_result: &CompilationResult) -> TriggerResult<CompilationResult> {
        self.calls.compilations.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_compilation.lock().unwrap() = Some((parent.to_string(), compilation_result.clone()));
        if self.fail_compilation {
            return Err(TriggerError::Remote { status: 403, message: "permission denied".into() });
        }
        let mut created = compilation_result.clone();
        created.name = if self.omit_compilation_name { None } else { Some(COMPILATION_NAME.into()) };
        Ok(created)
    }

    async fn create_workflow_invocation(&self, parent: &str, workflow_invocation: &WorkflowInvocation) -> TriggerResult<WorkflowInvocation> {
        self.calls.invocations.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_invocation.lock().unwrap() = Some((parent.to_string(), workflow_invocation.clone()));
        let mut created = workflow_invocation.clone();
        created.state = Some("RUNNING".into());
        Ok(created)
    }
}

fn pipeline_with(mock: &MockApi) -> PipelineCtl<MockApi> {
    PipelineCtl::new(Arc::new(Config::new_test()), mock.clone())
}

fn jan_16() -> Result<OffsetDateTime> {
    Ok(Date::from_calendar_date(2024, Month::January, 16)?.midnight().assume_utc())
}

#[tokio::test]
async fn pipeline_threads_compilation_name_into_invocation() -> Result<()> {
    let mock = MockApi::default();
    let pipeline = pipeline_with(&mock);
    let envelope = fixtures::load_job_envelope("events_20240115");

    let result = pipeline.execute(&envelope, jan_16()?).await;
    assert!(result.is_ok(), "expected pipeline to succeed, got {:?}", result);
    assert!(
        mock.calls.compilations.load(Ordering::SeqCst) == 1,
        "expected exactly one compilation call, got {}",
        mock.calls.compilations.load(Ordering::SeqCst)
    );
    assert!(
        mock.calls.invocations.load(Ordering::SeqCst) == 1,
        "expected exactly one invocation call, got {}",
        mock.calls.invocations.load(Ordering::SeqCst)
    );

    let (parent, compilation) = mock.calls.last_compilation.lock().unwrap().take().expect("compilation call recorded");
    assert!(
        parent == "projects/my-project/locations/europe-west1/repositories/analytics",
        "unexpected compilation parent, got {}",
        parent
    );
    assert!(
        compilation.name.as_deref() == Some("dataform_ga4_compil_20240116_20240115"),
        "unexpected compilation name, got {:?}",
        compilation.name
    );
    assert!(
        compilation.workspace.as_deref() == Some("projects/my-project/locations/europe-west1/repositories/analytics/workspaces/prod"),
        "unexpected workspace path, got {:?}",
        compilation.workspace
    );
    let vars = &compilation.code_compilation_config.as_ref().expect("compilation config present").vars;
    assert!(vars.len() == 1, "expected exactly one compilation var, got {:?}", vars);
    assert!(
        vars.get(VAR_GA4_TABLE).map(String::as_str) == Some("events_20240115"),
        "expected raw table id under {}, got {:?}",
        VAR_GA4_TABLE,
        vars
    );

    let (parent, invocation) = mock.calls.last_invocation.lock().unwrap().take().expect("invocation call recorded");
    assert!(
        parent == "projects/my-project/locations/europe-west1/repositories/analytics",
        "unexpected invocation parent, got {}",
        parent
    );
    assert!(
        invocation.name.as_deref() == Some("dataform_ga4_invoke_20240116_20240115"),
        "unexpected invocation name, got {:?}",
        invocation.name
    );
    assert!(
        invocation.compilation_result.as_deref() == Some(COMPILATION_NAME),
        "expected the invocation to carry the exact compilation name returned by the API, got {:?}",
        invocation.compilation_result
    );
    let config = invocation.invocation_config.expect("invocation config present");
    assert!(!config.fully_refresh_incremental_tables_enabled, "expected full refresh disabled");
    assert!(config.transitive_dependencies_included, "expected transitive dependencies included");
    assert!(!config.transitive_dependents_included, "expected transitive dependents excluded");

    Ok(())
}

#[tokio::test]
async fn decode_failure_aborts_before_any_remote_call() -> Result<()> {
    let mock = MockApi::default();
    let pipeline = pipeline_with(&mock);
    let envelope = fixtures::envelope_with_data(Some("this is not base64!!!".into()));

    let res = pipeline.execute(&envelope, jan_16()?).await;
    assert!(matches!(res, Err(TriggerError::Decode(_))), "expected decode error, got {:?}", res);
    assert!(
        mock.calls.compilations.load(Ordering::SeqCst) == 0,
        "expected no compilation calls after decode failure, got {}",
        mock.calls.compilations.load(Ordering::SeqCst)
    );
    assert!(
        mock.calls.invocations.load(Ordering::SeqCst) == 0,
        "expected no invocation calls after decode failure, got {}",
        mock.calls.invocations.load(Ordering::SeqCst)
    );
    Ok(())
}

#[tokio::test]
async fn schema_failure_aborts_before_any_remote_call() -> Result<()> {
    let mock = MockApi::default();
    let pipeline = pipeline_with(&mock);
    let envelope = fixtures::envelope_for_payload(&json!({"protoPayload": {"serviceData": {}}}));

    let res = pipeline.execute(&envelope, jan_16()?).await;
    assert!(matches!(res, Err(TriggerError::Schema)), "expected schema error, got {:?}", res);
    assert!(
        mock.calls.compilations.load(Ordering::SeqCst) == 0,
        "expected no compilation calls after schema failure, got {}",
        mock.calls.compilations.load(Ordering::SeqCst)
    );
    Ok(())
}

#[tokio::test]
async fn compilation_rejection_aborts_before_invocation() -> Result<()> {
    let mock = MockApi { fail_compilation: true, ..Default::default() };
    let pipeline = pipeline_with(&mock);
    let envelope = fixtures::load_job_envelope("events_20240115");

    let res = pipeline.execute(&envelope, jan_16()?).await;
    assert!(matches!(res, Err(TriggerError::Remote { status: 403, .. })), "expected remote error, got {:?}", res);
    assert!(
        mock.calls.compilations.load(Ordering::SeqCst) == 1,
        "expected the compilation call to have been attempted, got {}",
        mock.calls.compilations.load(Ordering::SeqCst)
    );
    assert!(
        mock.calls.invocations.load(Ordering::SeqCst) == 0,
        "expected no invocation call after compilation failure, got {}",
        mock.calls.invocations.load(Ordering::SeqCst)
    );
    Ok(())
}

#[tokio::test]
async fn missing_compilation_name_aborts_before_invocation() -> Result<()> {
    let mock = MockApi { omit_compilation_name: true, ..Default::default() };
    let pipeline = pipeline_with(&mock);
    let envelope = fixtures::load_job_envelope("events_20240115");

    let res = pipeline.execute(&envelope, jan_16()?).await;
    assert!(matches!(res, Err(TriggerError::MalformedResponse(_))), "expected malformed response error, got {:?}", res);
    assert!(
        mock.calls.invocations.load(Ordering::SeqCst) == 0,
        "expected no invocation call without a compilation name, got {}",
        mock.calls.invocations.load(Ordering::SeqCst)
    );
    Ok(())
}
