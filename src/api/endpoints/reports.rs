//! Report endpoints.
//!
//! The database row holds the summary fields; the treatment list and the
//! annotated image live in the artifact store. Artifact failures are
//! logged and never fail the request.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::Severity;
use crate::models::{NewReport, Report};
use crate::storage::ReportSidecar;

const DATA_IMAGE_PREFIX: &str = "data:image/";

#[derive(Debug, Deserialize)]
pub struct ReportCreate {
    pub filename: Option<String>,
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub treatment: Vec<String>,
    /// `data:image/<type>;base64,...` URL of the client-annotated image.
    pub annotated_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOut {
    pub id: i64,
    pub filename: Option<String>,
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub treatment: Vec<String>,
}

impl ReportOut {
    fn from_report(report: Report, treatment: Vec<String>) -> Self {
        Self {
            id: report.id,
            filename: report.filename,
            disease: report.disease,
            confidence: report.confidence,
            severity: report.severity,
            recommendations: report.recommendations,
            treatment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

fn report_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Report {id} not found"))
}

/// `POST /reports`
pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ReportCreate>, JsonRejection>,
) -> Result<Json<ReportOut>, ApiError> {
    let Json(payload) = payload?;

    if !(0.0..=1.0).contains(&payload.confidence) {
        return Err(ApiError::BadRequest(format!(
            "confidence must be within [0, 1], got {}",
            payload.confidence
        )));
    }

    let conn = ctx.core.open_db()?;
    let report = db::insert_report(
        &conn,
        &NewReport {
            filename: payload.filename.clone(),
            disease: payload.disease.clone(),
            confidence: payload.confidence,
            severity: payload.severity,
            recommendations: payload.recommendations.clone(),
        },
    )?;

    let store = ctx.core.store();
    let timestamp = chrono::Utc::now().timestamp();

    let annotated_image_path = payload
        .annotated_image
        .as_deref()
        .filter(|url| url.starts_with(DATA_IMAGE_PREFIX))
        .and_then(|url| match store.save_annotated_image(report.id, url, timestamp) {
            Ok(path) => Some(path.to_string_lossy().into_owned()),
            Err(e) => {
                tracing::warn!(report_id = report.id, "Annotated image not saved: {e}");
                None
            }
        });

    let sidecar = ReportSidecar {
        id: report.id,
        filename: report.filename.clone(),
        disease: report.disease.clone(),
        confidence: report.confidence,
        severity: report.severity,
        recommendations: report.recommendations.clone(),
        treatment: payload.treatment.clone(),
        annotated_image_path,
        created_at: Some(report.created_at.format(db::repository::DATETIME_FORMAT).to_string()),
    };
    if let Err(e) = store.write_sidecar(&sidecar, timestamp) {
        tracing::warn!(report_id = report.id, "Report sidecar not written: {e}");
    }

    tracing::info!(
        report_id = report.id,
        disease = %report.disease,
        confidence = report.confidence,
        "Report created"
    );

    Ok(Json(ReportOut::from_report(report, payload.treatment)))
}

/// `GET /reports`: newest first. Treatment is only served per report.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<ReportOut>>, ApiError> {
    let conn = ctx.core.open_db()?;
    let reports = db::list_reports(&conn)?
        .into_iter()
        .map(|report| ReportOut::from_report(report, Vec::new()))
        .collect();
    Ok(Json(reports))
}

/// `GET /reports/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ReportOut>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    let report = db::get_report(&conn, id)?.ok_or_else(|| report_not_found(id))?;

    let treatment = match ctx.core.store().latest_sidecar(id) {
        Ok(Some(sidecar)) => sidecar.treatment,
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(report_id = id, "Report sidecar unreadable: {e}");
            Vec::new()
        }
    };

    Ok(Json(ReportOut::from_report(report, treatment)))
}

/// `GET /reports/:id/download`: tar.gz of the latest sidecar and image.
pub async fn download(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id?;
    let bundle = ctx
        .core
        .store()
        .bundle(id)?
        .ok_or_else(|| ApiError::NotFound(format!("Files for report {id} not found")))?;

    let disposition = format!("attachment; filename=\"report-{id}.tar.gz\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/gzip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bundle,
    )
        .into_response())
}

/// `DELETE /reports/:id`: removes the row, then every artifact file.
pub async fn remove(
    State(ctx): State<ApiContext>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Path(id) = id?;
    let conn = ctx.core.open_db()?;
    if !db::delete_report(&conn, id)? {
        return Err(report_not_found(id));
    }

    match ctx.core.store().delete(id) {
        Ok(files) => tracing::info!(report_id = id, files, "Report deleted"),
        Err(e) => tracing::warn!(report_id = id, "Report deleted, artifacts left behind: {e}"),
    }

    Ok(Json(DeleteResponse { ok: true }))
}
