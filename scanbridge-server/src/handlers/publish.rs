use std::path::{Path, PathBuf};

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use scanbridge_core::publish::{PublishEntry, pick_summary, region_filter};

use super::auth::PublishAuth;
use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

const SCAN_ID_FIELD: &str = "scan_id";
const REPORT_FIELD: &str = "report_zip";

/// Record a status event from the pipeline and remember it as the latest.
pub async fn publish_event(
    _auth: PublishAuth,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| {
                AppError::bad_request(format!("JSON parse error - {e}"))
            })?
    };

    let entry = PublishEntry::from_event(&body, Utc::now());
    info!(
        event = %entry.event_key(),
        repo = %entry.meta.repo,
        run_id = %entry.meta.run_id,
        account_id = %entry.meta.account_id,
        region = %entry.meta.region,
        "pipeline publish event received"
    );

    state.publish_store.record(entry.clone()).await?;

    Ok(Json(json!({ "ok": true, "latest_upload": entry })))
}

/// Current publish document as stored. Open to unauthenticated readers.
pub async fn latest_publish_state(
    State(state): State<AppState>,
) -> Json<Value> {
    let mut document = state.publish_store.load_document().await;
    Json(json!({
        "latest_upload": document["latest"].take(),
        "events": document["events"].take(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub region: Option<String>,
    #[serde(rename = "filter[region__in]")]
    pub region_in: Option<String>,
}

/// Summary the dashboard shows for one region, picked from the latest,
/// baseline and rescan events in that order. Without a region in the query
/// the configured bridge region is used.
pub async fn pipeline_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Json<Value> {
    let raw = query.region.or(query.region_in).unwrap_or_default();
    let region = match region_filter(&raw) {
        "" => state.config.bridge.region.trim(),
        region => region,
    };
    let current = state.publish_store.load().await;

    Json(json!({
        "region": region,
        "summary": pick_summary(&current, region),
    }))
}

#[derive(Debug, Default)]
struct ScanOutputForm {
    scan_id: Option<String>,
    report: Option<Bytes>,
}

/// Store a finished report archive and mark its scan completed.
///
/// The archive counts as published once it is on disk. A failed scan update
/// is reported as `db_error` alongside a 200.
pub async fn publish_scan_output(
    _auth: PublishAuth,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<Value>> {
    let form = read_scan_output_form(multipart).await?;

    let scan_id = form
        .scan_id
        .map(|raw| raw.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("scan_id is required."))?;
    let report = form
        .report
        .ok_or_else(|| AppError::bad_request("report_zip file is required."))?;

    if !is_safe_file_stem(&scan_id) {
        return Err(AppError::bad_request(
            "scan_id contains invalid path characters.",
        ));
    }

    let target = report_path(&state.publish().pipeline_scans_dir(), &scan_id);
    save_report(&target, &report).await.map_err(|e| {
        warn!(
            scan_id = %scan_id,
            path = %target.display(),
            error = %e,
            "pipeline scan-output: failed to save report"
        );
        AppError::internal(format!("Failed to save report: {e}"))
    })?;

    let output_location = target.display().to_string();
    info!(
        scan_id = %scan_id,
        path = %output_location,
        bytes = report.len(),
        "pipeline scan-output: report saved"
    );

    match state
        .scans
        .mark_completed(&scan_id, &output_location)
        .await
    {
        Ok(0) => {
            warn!(
                scan_id = %scan_id,
                "pipeline scan-output: no scan row matched"
            );
        }
        Ok(_) => {
            info!(
                scan_id = %scan_id,
                "pipeline scan-output: scan marked completed"
            );
        }
        Err(err) => {
            warn!(
                scan_id = %scan_id,
                error = %err,
                "pipeline scan-output: DB update failed"
            );
            return Ok(Json(json!({
                "ok": true,
                "output_location": output_location,
                "db_error": err.to_string(),
            })));
        }
    }

    Ok(Json(json!({
        "ok": true,
        "output_location": output_location,
    })))
}

async fn read_scan_output_form(
    mut multipart: Multipart,
) -> AppResult<ScanOutputForm> {
    let mut form = ScanOutputForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), e.body_text()))?
    {
        match field.name() {
            Some(SCAN_ID_FIELD) if form.scan_id.is_none() => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::new(e.status(), e.body_text()))?;
                form.scan_id = Some(text);
            }
            // Only a file part counts; a plain text value is ignored.
            Some(REPORT_FIELD)
                if form.report.is_none() && field.file_name().is_some() =>
            {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::new(e.status(), e.body_text()))?;
                form.report = Some(bytes);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// A scan id is used as a file name, so it must not name another directory.
pub fn is_safe_file_stem(scan_id: &str) -> bool {
    !scan_id.contains(['/', '\\', '\0']) && !scan_id.contains("..")
}

pub fn report_path(scans_dir: &Path, scan_id: &str) -> PathBuf {
    scans_dir.join(format!("{scan_id}.zip"))
}

async fn save_report(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = target.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(target, bytes).await
}
