//! `get_host_groups` (`hostgroup.get`)

use super::{ids, limit_or_default, ApiCall};
use serde::{Deserialize, Serialize};

/// Arguments of `get_host_groups`.
#[derive(Debug, Default, Deserialize)]
pub struct GetHostGroups {
    #[serde(default)]
    groupids: Option<String>,
    #[serde(default)]
    hostids: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    limit: Option<f64>,
}

#[derive(Debug, Serialize)]
struct HostGroupGetParams {
    output: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groupids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hostids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<serde_json::Value>,
    #[serde(rename = "selectHosts")]
    select_hosts: [&'static str; 2],
    limit: u64,
}

impl ApiCall for GetHostGroups {
    const NAME: &'static str = "get_host_groups";
    const DESCRIPTION: &'static str =
        "List host groups from Zabbix server. Can filter by group IDs, host IDs, or search term.";
    const METHOD: &'static str = "hostgroup.get";
    const FAILURE: &'static str = "Failed to get host groups";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "groupids": {
                    "type": "string",
                    "description": "Comma-separated list of host group IDs to filter by"
                },
                "hostids": {
                    "type": "string",
                    "description": "Comma-separated list of host IDs to filter by"
                },
                "search": {
                    "type": "string",
                    "description": "Search host groups by name"
                },
                "limit": {
                    "type": "number",
                    "description": "Maximum number of groups to return (default: 100)"
                }
            }
        })
    }

    fn into_params(self) -> Result<serde_json::Value, String> {
        let params = HostGroupGetParams {
            output: "extend",
            groupids: ids(self.groupids.as_deref()),
            hostids: ids(self.hostids.as_deref()),
            search: self
                .search
                .filter(|s| !s.is_empty())
                .map(|name| serde_json::json!({ "name": name })),
            select_hosts: ["hostid", "name"],
            limit: limit_or_default(self.limit),
        };
        serde_json::to_value(params).map_err(|e| e.to_string())
    }
}
