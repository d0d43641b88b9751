//! Artifact name derivation.

use time::OffsetDateTime;

/// Name prefix for compilation results.
const COMPILATION_PREFIX: &str = "dataform_ga4_compil_";
/// Name prefix for workflow invocations.
const INVOCATION_PREFIX: &str = "dataform_ga4_invoke_";
/// The table id fragment removed during sanitization.
///
/// NOTE: only the first occurrence is removed, and it is not anchored to the start of the id.
/// Downstream naming depends on this exact behavior.
const TABLE_ID_FRAGMENT: &str = "events_";

/// Deterministic, human-readable names for the artifacts created per trigger.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DerivedNames {
    /// Name of the compilation result to create.
    pub compilation: String,
    /// Name of the workflow invocation to create.
    pub invocation: String,
}

/// Derive artifact names from the given reference instant and raw table id.
///
/// The instant is injected by the caller rather than read from the clock here, so the same
/// `(instant, table id)` pair always yields identical names.
pub fn derive(instant: OffsetDateTime, table_id: &str) -> DerivedNames {
    let stamp = date_stamp(instant);
    let sanitized = table_id.replacen(TABLE_ID_FRAGMENT, "", 1);
    DerivedNames {
        compilation: format!("{}{}_{}", COMPILATION_PREFIX, stamp, sanitized),
        invocation: format!("{}{}_{}", INVOCATION_PREFIX, stamp, sanitized),
    }
}

/// Format the instant's calendar date as `YYYYMMDD`.
fn date_stamp(instant: OffsetDateTime) -> String {
    format!("{:04}{:02}{:02}", instant.year(), u8::from(instant.month()), instant.day())
}
