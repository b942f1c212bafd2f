//! Request config sanitization.
//!
//! Provider request params arrive as free-form JSON and may embed
//! time-limited object URLs for reference images. Before anything is
//! persisted, those URLs must be reduced to storage keys
//! ([`convert_url_fields`]), and the whole structure is then swept
//! recursively ([`validate_no_urls`]) so that a fetchable URL can never
//! reach the database — including in fields nobody thought to convert.

use serde_json::Value;

use crate::error::CoreError;
use crate::files::FileService;

/// Maximum number of characters of an offending value echoed back in a
/// [`CoreError::ConfigValidation`].
const PREVIEW_LEN: usize = 48;

/// Returns true for strings that would be retrievable as-is.
fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Returns true for strings that embed a URL anywhere, including
/// free-text values like `"see https://… for reference"`.
fn contains_url(s: &str) -> bool {
    s.contains("http://") || s.contains("https://")
}

/// Truncate a value for inclusion in an error message.
fn preview(s: &str) -> String {
    if s.chars().count() <= PREVIEW_LEN {
        s.to_string()
    } else {
        let cut: String = s.chars().take(PREVIEW_LEN).collect();
        format!("{cut}…")
    }
}

// ---------------------------------------------------------------------------
// Targeted conversion
// ---------------------------------------------------------------------------

/// Convert designated URL-carrying fields of `config` to storage keys.
///
/// Each field in `url_fields` may hold a single URL string or an array
/// of URL strings. Conversion is best-effort per field: a failed
/// `key_from_url` is logged and the original value is left in place; it
/// will then be caught by [`validate_no_urls`].
pub async fn convert_url_fields(
    config: &mut Value,
    url_fields: &[&str],
    files: &dyn FileService,
) {
    let Some(obj) = config.as_object_mut() else {
        return;
    };

    for &field in url_fields {
        match obj.get_mut(field) {
            Some(Value::String(s)) if is_url(s) => {
                match files.key_from_url(s).await {
                    Ok(key) => *s = key,
                    Err(e) => {
                        tracing::warn!(field, error = %e, "Could not resolve URL field to storage key");
                    }
                }
            }
            Some(Value::Array(items)) => {
                for (idx, item) in items.iter_mut().enumerate() {
                    let Value::String(s) = item else { continue };
                    if !is_url(s) {
                        continue;
                    }
                    match files.key_from_url(s).await {
                        Ok(key) => *s = key,
                        Err(e) => {
                            tracing::warn!(
                                field,
                                index = idx,
                                error = %e,
                                "Could not resolve URL field to storage key",
                            );
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Recursive validation
// ---------------------------------------------------------------------------

/// Verify that no string anywhere in `config` carries a retrievable
/// URL, even embedded mid-sentence in a free-text value.
///
/// Walks nested objects and arrays. On the first violation, returns
/// [`CoreError::ConfigValidation`] naming the dotted/indexed path (e.g.
/// `imageUrls[2]` or `style.note`) and a truncated preview of the
/// value. This pass runs unconditionally — it is the backstop for
/// fields that were never designated for conversion.
pub fn validate_no_urls(config: &Value) -> Result<(), CoreError> {
    walk(config, "")
}

fn walk(value: &Value, path: &str) -> Result<(), CoreError> {
    match value {
        Value::String(s) if contains_url(s) => Err(CoreError::ConfigValidation {
            path: if path.is_empty() {
                "(root)".to_string()
            } else {
                path.to_string()
            },
            preview: preview(s),
        }),
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                walk(child, &child_path)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                walk(child, &format!("{path}[{idx}]"))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Combined pass
// ---------------------------------------------------------------------------

/// Sanitize a provider config in place: convert designated URL fields,
/// then validate the entire structure.
///
/// On success the config is guaranteed to contain no absolute URLs at
/// any depth. On failure the caller must not persist the config; the
/// in-place conversions that did succeed are keys, never URLs, so no
/// partially-fetchable state can leak out.
pub async fn sanitize_config(
    config: &mut Value,
    url_fields: &[&str],
    files: &dyn FileService,
) -> Result<(), CoreError> {
    convert_url_fields(config, url_fields, files).await;
    validate_no_urls(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::BaseUrlFileService;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn files() -> BaseUrlFileService {
        BaseUrlFileService::new(vec!["https://files.easel.test".to_string()])
    }

    // -- Targeted conversion --

    #[tokio::test]
    async fn converts_single_url_field() {
        let mut config = json!({ "imageUrl": "https://files.easel.test/uploads/a.png" });
        sanitize_config(&mut config, &["imageUrl"], &files())
            .await
            .unwrap();
        assert_eq!(config["imageUrl"], "uploads/a.png");
    }

    #[tokio::test]
    async fn converts_url_array_field() {
        let mut config = json!({
            "imageUrls": [
                "https://files.easel.test/uploads/a.png",
                "uploads/already-a-key.png",
                "https://files.easel.test/uploads/b.png?sig=x",
            ],
        });
        sanitize_config(&mut config, &["imageUrls"], &files())
            .await
            .unwrap();
        assert_eq!(
            config["imageUrls"],
            json!(["uploads/a.png", "uploads/already-a-key.png", "uploads/b.png"])
        );
    }

    #[tokio::test]
    async fn failed_conversion_is_caught_by_validation() {
        // Foreign URL: conversion leaves it in place, validation rejects it.
        let mut config = json!({ "imageUrl": "https://elsewhere.test/a.png" });
        let err = sanitize_config(&mut config, &["imageUrl"], &files())
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::ConfigValidation { path, .. } if path == "imageUrl");
    }

    // -- Recursive validation --

    #[test]
    fn accepts_url_free_config() {
        let config = json!({
            "steps": 30,
            "style": { "name": "painterly", "weights": [0.2, 0.8] },
            "imageUrls": ["uploads/a.png"],
        });
        assert!(validate_no_urls(&config).is_ok());
    }

    #[test]
    fn rejects_url_in_nested_object() {
        let config = json!({ "style": { "note": "see https://example.com/x" } });
        let err = validate_no_urls(&config).unwrap_err();
        assert_matches!(err, CoreError::ConfigValidation { path, .. } if path == "style.note");
    }

    #[test]
    fn rejects_url_in_array_with_indexed_path() {
        let config = json!({ "imageUrls": ["uploads/a.png", "uploads/b.png", "https://cdn/x.png"] });
        let err = validate_no_urls(&config).unwrap_err();
        assert_matches!(err, CoreError::ConfigValidation { path, .. } if path == "imageUrls[2]");
    }

    #[test]
    fn rejects_url_in_undesignated_free_text_field() {
        let config = json!({ "note": "https://example.com/x" });
        let err = validate_no_urls(&config).unwrap_err();
        assert_matches!(err, CoreError::ConfigValidation { path, .. } if path == "note");
    }

    #[test]
    fn rejects_url_embedded_mid_sentence() {
        let config = json!({ "note": "match the palette of http://ref.test/a.png please" });
        let err = validate_no_urls(&config).unwrap_err();
        assert_matches!(err, CoreError::ConfigValidation { path, .. } if path == "note");
    }

    #[test]
    fn rejects_url_nested_in_array_of_objects() {
        let config = json!({ "layers": [{ "mask": "uploads/m.png" }, { "mask": "http://x/m.png" }] });
        let err = validate_no_urls(&config).unwrap_err();
        assert_matches!(err, CoreError::ConfigValidation { path, .. } if path == "layers[1].mask");
    }

    #[test]
    fn preview_is_truncated() {
        let long = format!("https://example.com/{}", "a".repeat(200));
        let config = json!({ "u": long });
        let err = validate_no_urls(&config).unwrap_err();
        match err {
            CoreError::ConfigValidation { preview, .. } => {
                assert!(preview.chars().count() <= PREVIEW_LEN + 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scalar_root_url_is_rejected() {
        let config = json!("https://example.com");
        let err = validate_no_urls(&config).unwrap_err();
        assert_matches!(err, CoreError::ConfigValidation { path, .. } if path == "(root)");
    }
}
