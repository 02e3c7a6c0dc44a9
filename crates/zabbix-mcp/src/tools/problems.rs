//! `get_problems` (`problem.get`)

use super::{ids, limit_or_default, parse_severities, ApiCall};
use serde::{Deserialize, Serialize};

/// Arguments of `get_problems`.
#[derive(Debug, Default, Deserialize)]
pub struct GetProblems {
    #[serde(default)]
    eventids: Option<String>,
    #[serde(default)]
    groupids: Option<String>,
    #[serde(default)]
    hostids: Option<String>,
    #[serde(default)]
    objectids: Option<String>,
    #[serde(default)]
    acknowledged: Option<bool>,
    #[serde(default)]
    suppressed: Option<bool>,
    #[serde(default)]
    severities: Option<String>,
    #[serde(default)]
    recent: Option<bool>,
    #[serde(default)]
    time_from: Option<f64>,
    #[serde(default)]
    time_till: Option<f64>,
    #[serde(default)]
    limit: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ProblemGetParams {
    output: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    eventids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groupids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hostids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    objectids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    acknowledged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suppressed: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    severities: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_from: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_till: Option<i64>,
    #[serde(rename = "selectTags")]
    select_tags: &'static str,
    sortfield: [&'static str; 1],
    sortorder: [&'static str; 1],
    limit: u64,
}

fn timestamp(value: Option<f64>) -> Option<i64> {
    value.filter(|v| *v > 0.0).map(|v| v as i64)
}

impl ApiCall for GetProblems {
    const NAME: &'static str = "get_problems";
    const DESCRIPTION: &'static str = "Retrieve problems according to the given parameters. \
        Problems are sorted by severity and time in descending order by default.";
    const METHOD: &'static str = "problem.get";
    const FAILURE: &'static str = "Failed to get problems";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "eventids": {"type": "string", "description": "Comma-separated list of event IDs to filter by"},
                "groupids": {"type": "string", "description": "Comma-separated list of host group IDs to filter by"},
                "hostids": {"type": "string", "description": "Comma-separated list of host IDs to filter by"},
                "objectids": {"type": "string", "description": "Comma-separated list of trigger IDs to filter by"},
                "acknowledged": {"type": "boolean", "description": "Filter by acknowledged status: true=only acknowledged, false=only unacknowledged"},
                "suppressed": {"type": "boolean", "description": "Filter by suppressed status: true=only suppressed, false=only unsuppressed"},
                "severities": {"type": "string", "description": "Comma-separated list of severities to filter by (0-5: not classified, info, warning, average, high, disaster)"},
                "recent": {"type": "boolean", "description": "Return only recently created problems (default: true)"},
                "time_from": {"type": "number", "description": "Return only problems that occurred after this Unix timestamp"},
                "time_till": {"type": "number", "description": "Return only problems that occurred before this Unix timestamp"},
                "limit": {"type": "number", "description": "Max problems to return (default: 100)"}
            }
        })
    }

    fn into_params(self) -> Result<serde_json::Value, String> {
        let params = ProblemGetParams {
            output: "extend",
            eventids: ids(self.eventids.as_deref()),
            groupids: ids(self.groupids.as_deref()),
            hostids: ids(self.hostids.as_deref()),
            objectids: ids(self.objectids.as_deref()),
            acknowledged: self.acknowledged,
            suppressed: self.suppressed,
            severities: self
                .severities
                .as_deref()
                .map(parse_severities)
                .unwrap_or_default(),
            recent: self.recent,
            time_from: timestamp(self.time_from),
            time_till: timestamp(self.time_till),
            select_tags: "extend",
            sortfield: ["eventid"],
            sortorder: ["DESC"],
            limit: limit_or_default(self.limit),
        };
        serde_json::to_value(params).map_err(|e| e.to_string())
    }
}
