//! Trigger event decoding.
//!
//! Load-job completion events arrive as Pub/Sub push deliveries. The interesting payload is a
//! BigQuery audit log entry, base64-encoded inside the push message, and the only field consumed
//! from it is the destination table id of the completed load job.

use anyhow::anyhow;
use serde::Deserialize;

use crate::error::{TriggerError, TriggerResult};

/// A Pub/Sub push delivery envelope.
#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    /// The pushed message.
    pub message: PushMessage,
    /// The full name of the subscription which pushed this delivery.
    #[serde(default)]
    pub subscription: Option<String>,
}

/// The message component of a push delivery.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// The base64-encoded message payload.
    #[serde(default)]
    pub data: Option<String>,
    /// The server-assigned id of the message.
    #[serde(default)]
    pub message_id: Option<String>,
}

/// The BigQuery audit log entry carried in a load-job completion event.
///
/// Only the path down to the load destination table id is modeled; everything else in the entry
/// is ignored during deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditLogEntry {
    proto_payload: Option<ProtoPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtoPayload {
    service_data: Option<ServiceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceData {
    job_completed_event: Option<JobCompletedEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobCompletedEvent {
    job: Option<Job>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    job_configuration: Option<JobConfiguration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobConfiguration {
    load: Option<LoadConfiguration>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadConfiguration {
    destination_table: Option<TableReference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableReference {
    table_id: Option<String>,
}

/// Extract the destination table id of the completed load job from the given envelope.
///
/// Fails with the decode variant if the envelope has no payload, the payload is not valid base64,
/// or the decoded bytes are not well-formed JSON; fails with the schema variant if the JSON is
/// well-formed but the expected field path is absent. No side effects, deterministic.
pub fn destination_table_id(envelope: &PushEnvelope) -> TriggerResult<String> {
    let data = envelope
        .message
        .data
        .as_deref()
        .ok_or_else(|| TriggerError::Decode(anyhow!("envelope has no message data field")))?;
    let bytes = base64::decode(data).map_err(|err| TriggerError::Decode(err.into()))?;
    let entry: AuditLogEntry = serde_json::from_slice(&bytes).map_err(|err| TriggerError::Decode(err.into()))?;
    entry
        .proto_payload
        .and_then(|payload| payload.service_data)
        .and_then(|data| data.job_completed_event)
        .and_then(|event| event.job)
        .and_then(|job| job.job_configuration)
        .and_then(|config| config.load)
        .and_then(|load| load.destination_table)
        .and_then(|table| table.table_id)
        .ok_or(TriggerError::Schema)
}
