use serde_json::{Map, Value};

use super::entry::{PublishEntry, PublishState};

const BASELINE_EVENT: &str = "baseline_scan";
const RESCAN_VERIFY_EVENT: &str = "rescan_verify";
const RESCAN_EVENT: &str = "rescan";

/// Pick the summary to show for `region`.
///
/// Preference order: the latest upload, then the baseline scan, then the
/// verification rescan. A candidate only counts when it was published for the
/// same region.
pub fn pick_summary<'a>(
    state: &'a PublishState,
    region: &str,
) -> Option<&'a Map<String, Value>> {
    let region = region.trim();
    if region.is_empty() {
        return None;
    }

    let rescan = state
        .events
        .get(RESCAN_VERIFY_EVENT)
        .or_else(|| state.events.get(RESCAN_EVENT));

    [state.latest.as_ref(), state.events.get(BASELINE_EVENT), rescan]
        .into_iter()
        .flatten()
        .find(|entry| matches_region(entry, region))
        .map(|entry| &entry.summary)
}

fn matches_region(entry: &PublishEntry, region: &str) -> bool {
    entry.meta.region.trim() == region
}

/// First region of a comma separated filter value such as
/// `ap-northeast-2,us-east-1`.
pub fn region_filter(raw: &str) -> &str {
    raw.split(',').next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn entry(event: &str, region: &str, reduced: i64) -> PublishEntry {
        PublishEntry::from_event(
            &json!({
                "meta": {"event": event, "region": region},
                "payload": {"reduced": reduced}
            }),
            Utc::now(),
        )
    }

    #[test]
    fn latest_wins_when_region_matches() {
        let mut state = PublishState::default();
        state.merge(entry(BASELINE_EVENT, "ap-northeast-2", 1));
        state.merge(entry(RESCAN_VERIFY_EVENT, "ap-northeast-2", 2));

        let summary = pick_summary(&state, "ap-northeast-2").expect("summary");
        assert_eq!(summary["reduced"], json!(2));
    }

    #[test]
    fn falls_back_to_baseline_then_rescan() {
        let mut state = PublishState::default();
        state.merge(entry(RESCAN_EVENT, "eu-west-1", 3));
        state.merge(entry(BASELINE_EVENT, "us-east-1", 1));
        state.merge(entry("custom", "sa-east-1", 9));

        let baseline = pick_summary(&state, "us-east-1").expect("baseline");
        assert_eq!(baseline["reduced"], json!(1));
        let rescan = pick_summary(&state, " eu-west-1 ").expect("rescan");
        assert_eq!(rescan["reduced"], json!(3));
        assert!(pick_summary(&state, "ap-south-1").is_none());
    }

    #[test]
    fn verify_rescan_shadows_plain_rescan() {
        let mut state = PublishState::default();
        state.merge(entry(RESCAN_EVENT, "eu-west-1", 3));
        state.merge(entry(RESCAN_VERIFY_EVENT, "us-east-1", 4));
        state.merge(entry("other", "ap-south-1", 0));

        assert!(pick_summary(&state, "eu-west-1").is_none());
        let verify = pick_summary(&state, "us-east-1").expect("verify");
        assert_eq!(verify["reduced"], json!(4));
    }

    #[test]
    fn empty_region_selects_nothing() {
        let mut state = PublishState::default();
        state.merge(entry(BASELINE_EVENT, "", 1));
        assert!(pick_summary(&state, "").is_none());
    }

    #[test]
    fn region_filter_takes_first_value() {
        assert_eq!(region_filter(" us-east-1 , eu-west-1"), "us-east-1");
        assert_eq!(region_filter(""), "");
    }
}
