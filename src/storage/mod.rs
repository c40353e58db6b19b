//! On-disk report artifacts.
//!
//! Each persisted report may leave behind a JSON sidecar under `reports/`
//! and a decoded annotated image under `images/`. Both are named
//! `{id}-{unix_ts}.{ext}`; the sidecar is the only place the treatment
//! list survives, since the database row does not carry it.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::enums::Severity;

const REPORTS_DIR: &str = "reports";
const IMAGES_DIR: &str = "images";
const DEFAULT_IMAGE_EXT: &str = "png";
const BUNDLE_PREFIX: &str = "report";

static DATA_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/([^;,]*)[^,]*;base64,").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// JSON sidecar written next to every stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSidecar {
    pub id: i64,
    pub filename: Option<String>,
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub treatment: Vec<String>,
    pub annotated_image_path: Option<String>,
    pub created_at: Option<String>,
}

/// Image bytes decoded from a `data:image/...;base64,` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub ext: String,
    pub bytes: Vec<u8>,
}

/// Decode an annotated-image data URL.
///
/// The extension comes from the MIME subtype with any `+suffix` dropped
/// (`svg+xml` → `svg`). Empty or non-alphanumeric subtypes fall back to `png`.
pub fn decode_data_url(data_url: &str) -> Result<DecodedImage, StorageError> {
    let caps = DATA_URL
        .captures(data_url)
        .ok_or_else(|| StorageError::InvalidDataUrl("expected data:image/<type>;base64,".into()))?;

    let subtype = caps.get(1).map_or("", |m| m.as_str());
    let ext = subtype.split('+').next().unwrap_or_default().to_ascii_lowercase();
    let ext = if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        DEFAULT_IMAGE_EXT.to_string()
    } else {
        ext
    };

    let payload_start = caps.get(0).map_or(0, |m| m.end());
    let payload: String = data_url[payload_start..]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;

    Ok(DecodedImage { ext, bytes })
}

// ═══════════════════════════════════════════════════════════
// ReportStore
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct ReportStore {
    reports_dir: PathBuf,
    images_dir: PathBuf,
}

impl ReportStore {
    /// Open (and create if missing) the artifact directories under `root`.
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        let reports_dir = root.join(REPORTS_DIR);
        let images_dir = root.join(IMAGES_DIR);
        std::fs::create_dir_all(&reports_dir)?;
        std::fs::create_dir_all(&images_dir)?;
        Ok(Self {
            reports_dir,
            images_dir,
        })
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Decode and write an annotated image as `images/{id}-{ts}.{ext}`.
    pub fn save_annotated_image(
        &self,
        id: i64,
        data_url: &str,
        timestamp: i64,
    ) -> Result<PathBuf, StorageError> {
        let image = decode_data_url(data_url)?;
        let path = self
            .images_dir
            .join(format!("{id}-{timestamp}.{}", image.ext));
        std::fs::write(&path, &image.bytes)?;
        tracing::info!(report_id = id, path = %path.display(), bytes = image.bytes.len(), "Annotated image saved");
        Ok(path)
    }

    /// Write the pretty-printed sidecar as `reports/{id}-{ts}.json`.
    pub fn write_sidecar(
        &self,
        sidecar: &ReportSidecar,
        timestamp: i64,
    ) -> Result<PathBuf, StorageError> {
        let path = self
            .reports_dir
            .join(format!("{}-{timestamp}.json", sidecar.id));
        let json = serde_json::to_vec_pretty(sidecar)?;
        std::fs::write(&path, json)?;
        tracing::debug!(report_id = sidecar.id, path = %path.display(), "Report sidecar written");
        Ok(path)
    }

    /// Most recent sidecar for `id`, by embedded timestamp.
    pub fn latest_sidecar(&self, id: i64) -> Result<Option<ReportSidecar>, StorageError> {
        let Some(path) = self.latest_sidecar_path(id)? else {
            return Ok(None);
        };
        let bytes = std::fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Build a tar.gz holding the latest sidecar and the first image under
    /// `report/`. `None` when the report left no files behind.
    pub fn bundle(&self, id: i64) -> Result<Option<Vec<u8>>, StorageError> {
        let sidecar = self.latest_sidecar_path(id)?;
        let image = self.artifacts(&self.images_dir, id)?.into_iter().next();

        if sidecar.is_none() && image.is_none() {
            return Ok(None);
        }

        let mut tar_gz = Vec::new();
        {
            let gz = flate2::write::GzEncoder::new(&mut tar_gz, flate2::Compression::default());
            let mut tar = tar::Builder::new(gz);

            for path in sidecar.iter().chain(image.iter()) {
                if let Some(name) = path.file_name() {
                    tar.append_path_with_name(path, Path::new(BUNDLE_PREFIX).join(name))?;
                }
            }

            tar.into_inner()?.finish()?;
        }

        tracing::info!(report_id = id, size_bytes = tar_gz.len(), "Report bundle built");
        Ok(Some(tar_gz))
    }

    /// Remove every `{id}-*` file in both directories. Returns the count removed.
    pub fn delete(&self, id: i64) -> Result<usize, StorageError> {
        let mut removed = 0;
        for dir in [&self.reports_dir, &self.images_dir] {
            for path in self.artifacts(dir, id)? {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(report_id = id, path = %path.display(), "Failed to remove artifact: {e}");
                    }
                }
            }
        }
        Ok(removed)
    }

    fn latest_sidecar_path(&self, id: i64) -> Result<Option<PathBuf>, StorageError> {
        let latest = self
            .artifacts(&self.reports_dir, id)?
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .max_by_key(|p| (artifact_timestamp(p), p.clone()));
        Ok(latest)
    }

    /// Files named `{id}-*` in `dir`, sorted by name.
    fn artifacts(&self, dir: &Path, id: i64) -> Result<Vec<PathBuf>, StorageError> {
        let prefix = format!("{id}-");
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(&prefix) && entry.path().is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// The `{ts}` part of `{id}-{ts}.{ext}`; unparseable names sort first.
fn artifact_timestamp(path: &Path) -> i64 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.split_once('-'))
        .and_then(|(_, ts)| ts.parse().ok())
        .unwrap_or(i64::MIN)
}
