use serde::Serialize;
use std::collections::BTreeMap;

/// Dashboard counters read straight off the requests table.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total_users: i64,
    pub total_requests: i64,
    pub pending_requests: i64,
    pub resolved_requests: i64,
    pub status_breakdown: BTreeMap<String, i64>,
    pub priority_breakdown: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: RequestStats,
}
