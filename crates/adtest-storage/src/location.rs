//! Parsing of stored video locations.

use std::fmt;
use url::Url;

use crate::error::{StorageError, StorageResult};

/// Access modes that may precede the bucket in a Storage object URL.
const OBJECT_ACCESS_MODES: &[&str] = &["public", "sign", "authenticated"];

/// Bucket and object path of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub bucket: String,
    pub path: String,
}

impl BlobLocation {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Parse `bucket/path/to/file.mp4` or a Storage object URL such as
    /// `https://<ref>.supabase.co/storage/v1/object/public/bucket/path.mp4`.
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Self::parse_url(raw);
        }

        let trimmed = raw.trim_start_matches('/');
        match trimmed.split_once('/') {
            Some((bucket, path)) if !bucket.is_empty() && !path.is_empty() => {
                Ok(Self::new(bucket, path))
            }
            _ => Err(StorageError::invalid_location(format!(
                "expected 'bucket/path', got '{}'",
                raw
            ))),
        }
    }

    fn parse_url(raw: &str) -> StorageResult<Self> {
        let url = Url::parse(raw)
            .map_err(|e| StorageError::invalid_location(format!("{}: {}", raw, e)))?;

        let segments: Vec<String> = url
            .path_segments()
            .map(|s| {
                s.filter(|seg| !seg.is_empty())
                    .map(|seg| {
                        urlencoding::decode(seg)
                            .map(|d| d.into_owned())
                            .unwrap_or_else(|_| seg.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut rest = match segments.iter().position(|s| s == "object") {
            Some(idx) => &segments[idx + 1..],
            None => &segments[..],
        };
        if let Some(first) = rest.first() {
            if OBJECT_ACCESS_MODES.contains(&first.as_str()) {
                rest = &rest[1..];
            }
        }

        match rest {
            [bucket, path @ ..] if !path.is_empty() => {
                Ok(Self::new(bucket.clone(), path.join("/")))
            }
            _ => Err(StorageError::invalid_location(format!(
                "no bucket and object path in '{}'",
                raw
            ))),
        }
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}
