use serde::{Deserialize, Serialize};

/// Where a notification came from, echoed back to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanContext {
    pub scan_id: String,
    pub tenant_id: String,
    pub provider_id: String,
    pub provider_uid: String,
    pub provider_alias: String,
    pub scan_name: String,
}

/// Body posted in `bridge` mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub account_id: String,
    pub region: String,
    pub deploy_vulnerable: bool,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub scan_context: ScanContext,
}

impl NotificationPayload {
    /// Reshape into the `workflow_dispatch` body. GitHub only accepts string
    /// inputs, so the flag is sent as `"true"`/`"false"`.
    pub fn to_dispatch(&self, compliance_mode: &str) -> DispatchPayload {
        DispatchPayload {
            git_ref: self.git_ref.clone(),
            inputs: DispatchInputs {
                deploy_vulnerable: self.deploy_vulnerable.to_string(),
                account_id: self.account_id.clone(),
                compliance_mode: compliance_mode.to_string(),
            },
        }
    }
}

/// Body posted in `github_dispatch` mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub inputs: DispatchInputs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchInputs {
    pub deploy_vulnerable: String,
    pub account_id: String,
    pub compliance_mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> NotificationPayload {
        NotificationPayload {
            account_id: "123456789012".into(),
            region: "ap-northeast-2".into(),
            deploy_vulnerable: true,
            git_ref: "main".into(),
            scan_context: ScanContext {
                scan_id: "scan".into(),
                ..ScanContext::default()
            },
        }
    }

    #[test]
    fn notification_uses_ref_key() {
        let value = serde_json::to_value(payload()).expect("serializes");
        assert_eq!(value["ref"], json!("main"));
        assert_eq!(value["deploy_vulnerable"], json!(true));
        assert_eq!(value["scan_context"]["scan_id"], json!("scan"));
        assert!(value.get("git_ref").is_none());
    }

    #[test]
    fn dispatch_shape_stringifies_flag() {
        let dispatch = payload().to_dispatch("cis_1.4_plus_isms_p");
        let value = serde_json::to_value(dispatch).expect("serializes");
        assert_eq!(
            value,
            json!({
                "ref": "main",
                "inputs": {
                    "deploy_vulnerable": "true",
                    "account_id": "123456789012",
                    "compliance_mode": "cis_1.4_plus_isms_p"
                }
            })
        );
    }
}
