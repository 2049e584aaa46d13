// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem scan archive.
//!
//! Layout: `scans/YYYY/MM/DD/{sender}/{scan_id}.jpg` with the result next to
//! it as `{scan_id}_result.json`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fasal_core::{FasalError, ScanArchive, ScanRecord};
use tracing::info;

/// Archive rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Sender id made safe for a path segment: `+` dropped, `:` to `_`.
pub fn sanitize_sender(sender: &str) -> String {
    let cleaned: String = sender
        .chars()
        .filter(|c| *c != '+')
        .map(|c| if c == ':' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    match cleaned.trim_matches('.') {
        "" => "unknown".to_string(),
        s => s.to_string(),
    }
}

/// Relative key of the stored image.
pub fn image_key(captured_at: DateTime<Utc>, sender: &str, scan_id: &str) -> String {
    format!(
        "scans/{}/{}/{scan_id}.jpg",
        captured_at.format("%Y/%m/%d"),
        sanitize_sender(sender)
    )
}

fn io_error(e: std::io::Error) -> FasalError {
    FasalError::Archive {
        source: Box::new(e),
    }
}

#[async_trait]
impl ScanArchive for FsArchive {
    async fn store(&self, scan: &ScanRecord) -> Result<String, FasalError> {
        let key = image_key(scan.captured_at, &scan.sender, &scan.scan_id);
        let image_path = self.root.join(&key);
        let result_path = image_path.with_file_name(format!("{}_result.json", scan.scan_id));

        if let Some(dir) = image_path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
        }
        tokio::fs::write(&image_path, &scan.image.bytes)
            .await
            .map_err(io_error)?;

        let json = serde_json::to_vec_pretty(&scan.result).map_err(|e| FasalError::Archive {
            source: Box::new(e),
        })?;
        tokio::fs::write(&result_path, json).await.map_err(io_error)?;

        info!(key = %key, "scan archived");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fasal_core::ImagePayload;

    #[test]
    fn sender_is_sanitized() {
        assert_eq!(sanitize_sender("whatsapp:+919876543210"), "whatsapp_919876543210");
        assert_eq!(sanitize_sender("+15551234"), "15551234");
        assert_eq!(sanitize_sender("web"), "web");
        assert_eq!(sanitize_sender("../.."), "unknown");
    }

    #[test]
    fn key_follows_date_layout() {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();
        assert_eq!(
            image_key(at, "whatsapp:+9199", "a1b2c3d4"),
            "scans/2026/03/07/whatsapp_9199/a1b2c3d4.jpg"
        );
    }

    #[tokio::test]
    async fn stores_image_and_result() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::new(dir.path());
        let scan = ScanRecord {
            scan_id: "deadbeef".into(),
            sender: "+9112345".into(),
            captured_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            image: ImagePayload::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg", "+9112345"),
            result: serde_json::json!({"disease": "rice_blast"}),
        };

        let key = archive.store(&scan).await.unwrap();
        assert_eq!(key, "scans/2026/01/02/9112345/deadbeef.jpg");

        let image = tokio::fs::read(dir.path().join(&key)).await.unwrap();
        assert_eq!(image, scan.image.bytes);
        let result = tokio::fs::read_to_string(
            dir.path().join("scans/2026/01/02/9112345/deadbeef_result.json"),
        )
        .await
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["disease"], "rice_blast");
    }

    #[tokio::test]
    async fn unwritable_root_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let archive = FsArchive::new(&file);
        let scan = ScanRecord {
            scan_id: "00000000".into(),
            sender: "web".into(),
            captured_at: Utc::now(),
            image: ImagePayload::new(vec![1], "image/jpeg", "web"),
            result: serde_json::Value::Null,
        };
        assert!(matches!(
            archive.store(&scan).await,
            Err(FasalError::Archive { .. })
        ));
    }
}
