//! `get_triggers` (`trigger.get`)

use super::{ids, limit_or_default, ApiCall};
use serde::{Deserialize, Serialize};

/// Arguments of `get_triggers`.
#[derive(Debug, Default, Deserialize)]
pub struct GetTriggers {
    #[serde(default)]
    triggerids: Option<String>,
    #[serde(default)]
    hostids: Option<String>,
    #[serde(default)]
    min_severity: Option<f64>,
    #[serde(default)]
    limit: Option<f64>,
}

#[derive(Debug, Serialize)]
struct TriggerGetParams {
    output: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    triggerids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hostids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_severity: Option<u8>,
    #[serde(rename = "selectHosts")]
    select_hosts: &'static str,
    #[serde(rename = "selectTags")]
    select_tags: &'static str,
    limit: u64,
}

impl ApiCall for GetTriggers {
    const NAME: &'static str = "get_triggers";
    const DESCRIPTION: &'static str = "List triggers from Zabbix.";
    const METHOD: &'static str = "trigger.get";
    const FAILURE: &'static str = "Failed to get triggers";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "triggerids": {"type": "string", "description": "Comma-separated trigger IDs"},
                "hostids": {"type": "string", "description": "Comma-separated host IDs"},
                "min_severity": {"type": "number", "description": "Minimum severity (0-5)"},
                "limit": {"type": "number", "description": "Max triggers (default: 100)"}
            }
        })
    }

    fn into_params(self) -> Result<serde_json::Value, String> {
        let min_severity = match self.min_severity {
            None => None,
            Some(s) if (0.0..=5.0).contains(&s) => Some(s as u8),
            Some(s) => return Err(format!("min_severity must be between 0 and 5, got {}", s)),
        };

        let params = TriggerGetParams {
            output: "extend",
            triggerids: ids(self.triggerids.as_deref()),
            hostids: ids(self.hostids.as_deref()),
            min_severity,
            select_hosts: "extend",
            select_tags: "extend",
            limit: limit_or_default(self.limit),
        };
        serde_json::to_value(params).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_severity_bounds() {
        let args: GetTriggers =
            serde_json::from_value(serde_json::json!({"min_severity": 3, "hostids": "10084"}))
                .unwrap();
        let params = args.into_params().unwrap();
        assert_eq!(params["min_severity"], 3);
        assert_eq!(params["hostids"], serde_json::json!(["10084"]));

        let args: GetTriggers =
            serde_json::from_value(serde_json::json!({"min_severity": 9})).unwrap();
        assert!(args.into_params().unwrap_err().contains("min_severity"));
    }
}
