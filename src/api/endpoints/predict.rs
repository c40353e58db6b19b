//! Prediction endpoints.
//!
//! `POST /predict`: one diagnosis for an uploaded leaf image.
//! `POST /predict_multi`: jittered variants of the same diagnosis.
//!
//! Both take a multipart body with a `file` field. The bytes seed the
//! engine; the part's filename is the only other input.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::diagnosis::{BatchRequest, Diagnosis};

/// Variant count when `n` is omitted.
pub const DEFAULT_VARIANTS: i64 = 10;

const FILE_FIELD: &str = "file";

/// The `file` part of a multipart upload.
#[derive(Debug)]
pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Filename as the engine sees it. Missing names match nothing.
    pub fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or("")
    }
}

/// Pull the `file` part out of a multipart body. Other parts are skipped.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?.to_vec();
        return Ok(Upload { filename, bytes });
    }
    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

/// `POST /predict`
pub async fn predict(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Diagnosis>, ApiError> {
    let upload = read_upload(multipart?).await?;
    let engine = ctx.core.engine();

    let diagnosis = ctx
        .core
        .with_runtime_rng(|rng| engine.diagnose(&upload.bytes, upload.filename(), rng))?;

    tracing::info!(
        filename = upload.filename(),
        bytes = upload.bytes.len(),
        disease = %diagnosis.disease,
        confidence = diagnosis.confidence,
        severity = %diagnosis.severity,
        "Prediction served"
    );

    Ok(Json(diagnosis))
}

#[derive(Debug, Default, Deserialize)]
pub struct MultiParams {
    pub n: Option<i64>,
    pub seed: Option<i64>,
}

impl MultiParams {
    fn batch_request(&self) -> BatchRequest {
        BatchRequest {
            size: Some(self.n.unwrap_or(DEFAULT_VARIANTS)),
            seed: self.seed,
        }
    }
}

/// `POST /predict_multi?n=&seed=`
pub async fn predict_multi(
    State(ctx): State<ApiContext>,
    params: Result<Query<MultiParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<Diagnosis>>, ApiError> {
    let Query(params) = params?;
    let upload = read_upload(multipart?).await?;
    let request = params.batch_request();
    let engine = ctx.core.engine();

    let variants = ctx.core.with_runtime_rng(|rng| {
        engine.diagnose_batch(&upload.bytes, upload.filename(), &request, rng)
    })?;

    tracing::info!(
        filename = upload.filename(),
        requested = ?params.n,
        seeded = params.seed.is_some(),
        variants = variants.len(),
        "Batch prediction served"
    );

    Ok(Json(variants))
}
