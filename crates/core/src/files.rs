//! Blob storage collaborator interface.
//!
//! The platform stores user uploads in an opaque blob store and hands
//! out time-limited URLs for reading. Durable rows must never contain
//! those URLs — only the underlying storage key, so that access control
//! and URL expiry are applied at read time. [`FileService`] is the
//! narrow seam this crate needs from the storage subsystem.

use async_trait::async_trait;

use crate::error::CoreError;

/// Resolves previously-issued object URLs back to durable storage keys.
#[async_trait]
pub trait FileService: Send + Sync {
    /// Convert an object URL issued by this platform into its storage key.
    ///
    /// Fails if the URL does not point at platform-owned storage.
    async fn key_from_url(&self, url: &str) -> Result<String, CoreError>;
}

/// [`FileService`] backed by a list of known public base URLs.
///
/// An issued object URL has the shape `{base}/{key}?{signature...}`.
/// Resolution strips the matching base and any signing query string,
/// leaving the bare key.
pub struct BaseUrlFileService {
    base_urls: Vec<String>,
}

impl BaseUrlFileService {
    /// Create a resolver for the given public base URLs.
    ///
    /// Trailing slashes on the bases are ignored.
    pub fn new(base_urls: Vec<String>) -> Self {
        let base_urls = base_urls
            .into_iter()
            .map(|b| b.trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty())
            .collect();
        Self { base_urls }
    }
}

#[async_trait]
impl FileService for BaseUrlFileService {
    async fn key_from_url(&self, url: &str) -> Result<String, CoreError> {
        for base in &self.base_urls {
            if let Some(rest) = url.strip_prefix(base.as_str()) {
                // Drop the signing query string, then the leading slash.
                let key = rest
                    .split('?')
                    .next()
                    .unwrap_or("")
                    .trim_start_matches('/');
                if key.is_empty() {
                    return Err(CoreError::Storage(format!(
                        "URL '{url}' has no object key after base '{base}'"
                    )));
                }
                return Ok(key.to_string());
            }
        }
        Err(CoreError::Storage(format!(
            "URL '{url}' does not point at platform storage"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> BaseUrlFileService {
        BaseUrlFileService::new(vec![
            "https://files.easel.test/".to_string(),
            "https://cdn.easel.test".to_string(),
        ])
    }

    #[tokio::test]
    async fn resolves_key_from_known_base() {
        let key = service()
            .key_from_url("https://files.easel.test/uploads/u1/ref.png")
            .await
            .unwrap();
        assert_eq!(key, "uploads/u1/ref.png");
    }

    #[tokio::test]
    async fn strips_signing_query_string() {
        let key = service()
            .key_from_url("https://cdn.easel.test/uploads/a.png?X-Expires=300&sig=abc")
            .await
            .unwrap();
        assert_eq!(key, "uploads/a.png");
    }

    #[tokio::test]
    async fn rejects_foreign_url() {
        let err = service()
            .key_from_url("https://example.com/x.png")
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Storage(_));
    }

    #[tokio::test]
    async fn rejects_base_with_no_key() {
        let err = service()
            .key_from_url("https://files.easel.test/")
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Storage(_));
    }
}
