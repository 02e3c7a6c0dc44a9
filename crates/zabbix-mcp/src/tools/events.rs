//! `acknowledge_event` (`event.acknowledge`)

use super::{split_ids, ApiCall};
use crate::types::ToolDefinition;
use serde::{Deserialize, Serialize};

/// Action bitmask value for "acknowledge".
const ACTION_ACKNOWLEDGE: u32 = 2;

/// Arguments of `acknowledge_event`.
#[derive(Debug, Deserialize)]
pub struct AcknowledgeEvent {
    eventids: String,
    #[serde(default)]
    action: Option<f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    severity: Option<f64>,
    #[serde(default)]
    suppress_until: Option<f64>,
    #[serde(default)]
    cause_eventid: Option<String>,
}

#[derive(Debug, Serialize)]
struct EventAcknowledgeParams {
    eventids: Vec<String>,
    action: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suppress_until: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause_eventid: Option<String>,
}

impl ApiCall for AcknowledgeEvent {
    const NAME: &'static str = "acknowledge_event";
    const DESCRIPTION: &'static str =
        "Acknowledge events or update them (add message, change severity, close, suppress, etc.).";
    const METHOD: &'static str = "event.acknowledge";
    const FAILURE: &'static str = "Failed to acknowledge events";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "eventids": {"type": "string", "description": "Comma-separated list of event IDs to acknowledge"},
                "action": {"type": "number", "description": "Action bitmask: 1=close, 2=acknowledge, 4=add message, 8=change severity, 16=unacknowledge, 32=suppress, 64=unsuppress, 128=change rank, 256=change symptoms to cause"},
                "message": {"type": "string", "description": "Message to add to the event"},
                "severity": {"type": "number", "description": "New severity (0-5) when action includes change severity (8)"},
                "suppress_until": {"type": "number", "description": "Unix timestamp until which to suppress the event"},
                "cause_eventid": {"type": "string", "description": "Cause event ID when changing symptom to cause"}
            },
            "required": ["eventids"]
        })
    }

    fn annotate(definition: ToolDefinition) -> ToolDefinition {
        definition.destructive()
    }

    fn into_params(self) -> Result<serde_json::Value, String> {
        let eventids = split_ids(&self.eventids);
        if eventids.is_empty() {
            return Err("eventids is required".to_string());
        }

        let severity = match self.severity {
            None => None,
            Some(s) if (0.0..=5.0).contains(&s) => Some(s as u8),
            Some(s) => return Err(format!("severity must be between 0 and 5, got {}", s)),
        };

        let params = EventAcknowledgeParams {
            eventids,
            action: self
                .action
                .filter(|a| *a >= 0.0)
                .map_or(ACTION_ACKNOWLEDGE, |a| a as u32),
            message: self.message.filter(|m| !m.is_empty()),
            severity,
            suppress_until: self.suppress_until.filter(|t| *t > 0.0).map(|t| t as i64),
            cause_eventid: self.cause_eventid.filter(|c| !c.is_empty()),
        };
        serde_json::to_value(params).map_err(|e| e.to_string())
    }

    fn render(params: &serde_json::Value, result: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "message": "Events acknowledged successfully",
            "eventids": params["eventids"],
            "response": result
        })
    }
}
