use serde_json::{Map, Value};

/// Payload keys carried into the stored summary. Everything else the pipeline
/// sends is dropped.
pub const SUMMARY_KEYS: [&str; 10] = [
    "baseline_fail",
    "post_fail",
    "reduced",
    "post_fail_remediable",
    "post_fail_manual_runbook",
    "threat_score",
    "threat_score_delta",
    "findings_status",
    "severity",
    "resource_inventory",
];

/// Older manifest writers emit this name for `baseline_fail`.
const LEGACY_BASELINE_FAIL: &str = "baseline_fail_count";

/// Project an arbitrary payload onto the summary allow-list.
///
/// Keys present in the payload are copied verbatim, `null` included. A
/// non-object payload yields an empty summary.
pub fn extract_summary(payload: &Value) -> Map<String, Value> {
    let Some(object) = payload.as_object() else {
        return Map::new();
    };

    let mut summary: Map<String, Value> = SUMMARY_KEYS
        .iter()
        .filter_map(|key| {
            object.get(*key).map(|value| (key.to_string(), value.clone()))
        })
        .collect();

    if !summary.contains_key("baseline_fail")
        && let Some(legacy) = object.get(LEGACY_BASELINE_FAIL)
    {
        summary.insert("baseline_fail".to_string(), legacy.clone());
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pipeline_metrics_are_kept() {
        let payload = json!({
            "baseline_fail_count": 10,
            "threat_score": 91.2,
            "threat_score_delta": -2.5,
            "findings_status": {
                "fail": 5,
                "pass": 5,
                "fail_new": 1,
                "pass_new": 2
            },
            "severity": {
                "critical": 1,
                "high": 2,
                "medium": 3,
                "low": 4,
                "informational": 0
            },
            "resource_inventory": [{
                "id": "storage",
                "resources_count": 2,
                "total_findings": 4,
                "failed_findings": 3,
                "new_failed_findings": 1,
                "severity": {
                    "critical": 0,
                    "high": 1,
                    "medium": 1,
                    "low": 1,
                    "informational": 0
                }
            }]
        });

        let summary = extract_summary(&payload);

        assert_eq!(summary["baseline_fail"], json!(10));
        assert_eq!(summary["threat_score"], json!(91.2));
        assert_eq!(summary["threat_score_delta"], json!(-2.5));
        assert_eq!(summary["findings_status"]["fail"], json!(5));
        assert_eq!(summary["severity"]["critical"], json!(1));
        assert_eq!(summary["resource_inventory"][0]["id"], json!("storage"));
        assert!(!summary.contains_key("baseline_fail_count"));
    }

    #[test]
    fn canonical_key_wins_over_legacy_alias() {
        let summary = extract_summary(&json!({
            "baseline_fail": 3,
            "baseline_fail_count": 99,
        }));
        assert_eq!(summary["baseline_fail"], json!(3));
        assert_eq!(summary.len(), 1);
    }

    #[test]
    fn non_object_payloads_yield_empty_summary() {
        for payload in [json!(null), json!([1, 2]), json!("text"), json!(42)] {
            assert!(extract_summary(&payload).is_empty(), "{payload}");
        }
    }

    #[test]
    fn unknown_keys_are_dropped_and_nulls_are_kept() {
        let summary = extract_summary(&json!({
            "post_fail": null,
            "reduced": 4,
            "internal_debug": {"x": 1},
            "account_id": "123456789012",
        }));

        assert_eq!(summary.len(), 2);
        assert_eq!(summary["post_fail"], Value::Null);
        assert_eq!(summary["reduced"], json!(4));
        assert!(summary.keys().all(|k| SUMMARY_KEYS.contains(&k.as_str())));
    }
}
