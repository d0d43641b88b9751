//! Dataform API data models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::names::DerivedNames;

/// The compilation variable through which the raw destination table id is exported.
pub const VAR_GA4_TABLE: &str = "GA4_TABLE";

/// A named snapshot of workflow definitions plus variable bindings.
///
/// Sent as the body of a create call and returned by the API with server-populated fields.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    /// The resource name of the compilation result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Compile-time configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_compilation_config: Option<CodeCompilationConfig>,
    /// The resource path of the workspace to compile from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl CompilationResult {
    /// Build the compilation request body for a completed load job.
    ///
    /// The `vars` mapping carries exactly one entry: the raw, unsanitized table id under
    /// `GA4_TABLE`, which makes the freshly loaded table addressable from workflow definitions.
    pub fn for_load_job(names: &DerivedNames, table_id: &str, workspace_path: String) -> Self {
        let mut vars = HashMap::new();
        vars.insert(VAR_GA4_TABLE.to_string(), table_id.to_string());
        Self {
            name: Some(names.compilation.clone()),
            code_compilation_config: Some(CodeCompilationConfig { vars }),
            workspace: Some(workspace_path),
        }
    }
}

/// Compile-time configuration for a compilation result.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeCompilationConfig {
    /// User-defined variables made available to workflow definitions during compilation.
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

/// A requested execution run of a compilation result's workflow.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInvocation {
    /// The resource name of the workflow invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Execution-scope configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_config: Option<InvocationConfig>,
    /// The name of the compilation result to execute.
    ///
    /// Must be exactly the name returned by the compilation call of the same trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compilation_result: Option<String>,
    /// Server-assigned state of the invocation, present on responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl WorkflowInvocation {
    /// Build the invocation request body for a previously created compilation result.
    ///
    /// `compilation_name` is the name returned by the Dataform API for the compilation artifact,
    /// threaded through verbatim.
    pub fn for_compilation(names: &DerivedNames, compilation_name: String) -> Self {
        Self {
            name: Some(names.invocation.clone()),
            invocation_config: Some(InvocationConfig::default()),
            compilation_result: Some(compilation_name),
            state: None,
        }
    }
}

/// Execution-scope flags of a workflow invocation.
///
/// The flags are fixed for this service: execute the compiled actions along with their
/// transitive dependencies, without full refreshes and without dependents.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationConfig {
    /// Whether incremental tables are fully refreshed during execution.
    pub fully_refresh_incremental_tables_enabled: bool,
    /// Whether transitive dependencies of the selected actions are included.
    pub transitive_dependencies_included: bool,
    /// Whether transitive dependents of the selected actions are included.
    pub transitive_dependents_included: bool,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            fully_refresh_incremental_tables_enabled: false,
            transitive_dependencies_included: true,
            transitive_dependents_included: false,
        }
    }
}
