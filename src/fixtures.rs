use serde_json::json;

use crate::event::{PushEnvelope, PushMessage};

/// Build a push envelope carrying the given pre-encoded data field.
pub fn envelope_with_data(data: Option<String>) -> PushEnvelope {
    PushEnvelope {
        message: PushMessage { data, message_id: Some("1234567890".into()) },
        subscription: Some("projects/my-project/subscriptions/load-jobs".into()),
    }
}

/// Build a push envelope whose payload is the given JSON value, base64-encoded.
pub fn envelope_for_payload(payload: &serde_json::Value) -> PushEnvelope {
    envelope_with_data(Some(base64::encode(payload.to_string())))
}

/// Build a well-formed load-job completion envelope for the given destination table id.
pub fn load_job_envelope(table_id: &str) -> PushEnvelope {
    envelope_for_payload(&load_job_payload(table_id))
}

/// The audit log payload of a completed load job for the given destination table id.
pub fn load_job_payload(table_id: &str) -> serde_json::Value {
    json!({
        "protoPayload": {
            "serviceData": {
                "jobCompletedEvent": {
                    "eventName": "load_job_completed",
                    "job": {
                        "jobConfiguration": {
                            "load": {
                                "destinationTable": {
                                    "projectId": "my-project",
                                    "datasetId": "analytics_123456789",
                                    "tableId": table_id,
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}
