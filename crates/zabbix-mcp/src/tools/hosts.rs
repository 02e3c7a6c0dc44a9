//! `get_hosts` (`host.get`)

use super::{ids, limit_or_default, ApiCall};
use serde::{Deserialize, Serialize};

/// Arguments of `get_hosts`.
#[derive(Debug, Default, Deserialize)]
pub struct GetHosts {
    #[serde(default)]
    hostids: Option<String>,
    #[serde(default)]
    groupids: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    limit: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HostGetParams {
    output: &'static str,
    #[serde(rename = "hostids", skip_serializing_if = "Vec::is_empty")]
    host_ids: Vec<String>,
    #[serde(rename = "groupids", skip_serializing_if = "Vec::is_empty")]
    group_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<serde_json::Value>,
    select_host_groups: &'static str,
    select_parent_templates: &'static str,
    select_interfaces: &'static str,
    select_tags: &'static str,
    select_macros: &'static str,
    select_inventory: &'static str,
    limit: u64,
}

impl ApiCall for GetHosts {
    const NAME: &'static str = "get_hosts";
    const DESCRIPTION: &'static str =
        "List hosts from the Zabbix server. Can filter by host IDs, group IDs, or search term.";
    const METHOD: &'static str = "host.get";
    const FAILURE: &'static str = "Failed to get hosts";

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "hostids": {
                    "type": "string",
                    "description": "Comma-separated list of host IDs to filter by"
                },
                "groupids": {
                    "type": "string",
                    "description": "Comma-separated list of host group IDs to filter by"
                },
                "search": {
                    "type": "string",
                    "description": "Search hosts by name (partial match)"
                },
                "limit": {
                    "type": "number",
                    "description": "Maximum number of hosts to return (default: 100)"
                }
            }
        })
    }

    fn into_params(self) -> Result<serde_json::Value, String> {
        let params = HostGetParams {
            output: "extend",
            host_ids: ids(self.hostids.as_deref()),
            group_ids: ids(self.groupids.as_deref()),
            search: self
                .search
                .filter(|s| !s.is_empty())
                .map(|name| serde_json::json!({ "name": name })),
            select_host_groups: "extend",
            select_parent_templates: "extend",
            select_interfaces: "extend",
            select_tags: "extend",
            select_macros: "extend",
            select_inventory: "extend",
            limit: limit_or_default(self.limit),
        };
        serde_json::to_value(params).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = GetHosts::default().into_params().unwrap();
        assert_eq!(params["output"], "extend");
        assert_eq!(params["selectHostGroups"], "extend");
        assert_eq!(params["limit"], 100);
        assert!(params.get("hostids").is_none());
        assert!(params.get("search").is_none());
    }

    #[test]
    fn test_filters() {
        let args: GetHosts = serde_json::from_value(serde_json::json!({
            "hostids": "10084, 10085",
            "search": "web",
            "limit": 5
        }))
        .unwrap();
        let params = args.into_params().unwrap();

        assert_eq!(params["hostids"], serde_json::json!(["10084", "10085"]));
        assert_eq!(params["search"]["name"], "web");
        assert_eq!(params["limit"], 5);
    }
}
