//! File-backed catalog storage.
//!
//! The catalog lives in a single pretty-printed JSON file. It is read once at
//! startup and cached; a write validates the document, persists it and then
//! swaps the cached copy so in-flight requests keep their snapshot.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::catalog::models::{Catalog, ExtraField};

/// Catalog shipped with the binary, written by `init-db` when no file exists.
pub const DEFAULT_CATALOG_JSON: &str = include_str!("../../data/config.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed catalog: `industries` and `formats` must be lists")]
    MalformedShape,

    #[error("Duplicate {kind} '{key}' in {scope}")]
    DuplicateKey {
        kind: &'static str,
        key: String,
        scope: String,
    },
}

/// Validates a raw JSON document and turns it into a [`Catalog`].
///
/// The two top-level collections are checked before deserialization so the
/// caller gets a shape error rather than a serde message for the common case.
pub fn parse_catalog(raw: Value) -> Result<Catalog, CatalogError> {
    let is_list = |key: &str| raw.get(key).map(Value::is_array).unwrap_or(false);
    if !is_list("industries") || !is_list("formats") {
        return Err(CatalogError::MalformedShape);
    }
    let catalog: Catalog = serde_json::from_value(raw)?;
    check_unique_keys(&catalog)?;
    Ok(catalog)
}

fn ensure_unique<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    kind: &'static str,
    scope: impl Fn() -> String,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(CatalogError::DuplicateKey {
                kind,
                key: key.to_string(),
                scope: scope(),
            });
        }
    }
    Ok(())
}

fn check_fields(fields: &[ExtraField], scope: &str) -> Result<(), CatalogError> {
    ensure_unique(fields.iter().map(|f| f.id.as_str()), "field id", || {
        scope.to_string()
    })?;
    for field in fields {
        ensure_unique(
            field.items.iter().map(|i| i.value.as_str()),
            "item value",
            || format!("field '{}' of {scope}", field.id),
        )?;
    }
    Ok(())
}

fn check_unique_keys(catalog: &Catalog) -> Result<(), CatalogError> {
    ensure_unique(
        catalog.industries.iter().map(|i| i.name.as_str()),
        "industry",
        || "industries".to_string(),
    )?;
    for industry in &catalog.industries {
        ensure_unique(
            industry.experts.iter().map(|e| e.name.as_str()),
            "expert",
            || format!("industry '{}'", industry.name),
        )?;
    }

    ensure_unique(catalog.formats.iter().map(|f| f.id.as_str()), "format", || {
        "formats".to_string()
    })?;
    for format in &catalog.formats {
        let scope = format!("format '{}'", format.id);
        ensure_unique(
            format.sub_options.iter().map(|s| s.label.as_str()),
            "sub-option",
            || scope.clone(),
        )?;
        check_fields(&format.extra_fields, &scope)?;
        for sub in &format.sub_options {
            check_fields(&sub.fields, &format!("sub-option '{}' of {scope}", sub.label))?;
        }
    }

    check_fields(&catalog.common.fields, "common fields")
}

/// Cached, file-backed catalog.
pub struct CatalogStore {
    path: PathBuf,
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    /// Loads the catalog file at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let catalog = read_catalog_file(&path).await?;
        info!(
            "Catalog loaded from {}: {} industries, {} formats",
            path.display(),
            catalog.industries.len(),
            catalog.formats.len()
        );
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(catalog)),
        })
    }

    /// In-memory store; writes still go to `path`.
    pub fn with_catalog(path: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Point-in-time snapshot of the catalog.
    pub async fn current(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    /// Validates `raw`, writes it to disk as sent and makes it current.
    ///
    /// The write lock is held across the file write so concurrent replaces
    /// are serialized and the file always matches the cached catalog.
    pub async fn replace(&self, raw: Value) -> Result<Arc<Catalog>, CatalogError> {
        let catalog = Arc::new(parse_catalog(raw.clone())?);

        let mut guard = self.current.write().await;
        write_catalog_file(&self.path, &raw).await?;
        *guard = catalog.clone();
        info!("Catalog replaced at {}", self.path.display());
        Ok(catalog)
    }
}

async fn read_catalog_file(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = tokio::fs::read_to_string(path).await?;
    parse_catalog(serde_json::from_str(&raw)?)
}

/// Keys the typed model does not know about are kept in the file.
async fn write_catalog_file(path: &Path, raw: &Value) -> Result<(), CatalogError> {
    let body = serde_json::to_string_pretty(raw)?;
    // Write-then-rename so a crash never leaves a truncated catalog behind.
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Writes the bundled catalog to `path` unless a file is already there.
/// Returns `true` when a file was created.
pub async fn seed_catalog_file(path: &Path) -> Result<bool, CatalogError> {
    if tokio::fs::try_exists(path).await? {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, DEFAULT_CATALOG_JSON).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundled_catalog_is_valid() {
        let raw: Value = serde_json::from_str(DEFAULT_CATALOG_JSON).unwrap();
        let catalog = parse_catalog(raw).unwrap();
        assert!(catalog.format("staffing").is_some());
        assert!(!catalog.industries.is_empty());
    }

    #[test]
    fn test_rejects_missing_formats_list() {
        let err = parse_catalog(json!({"industries": []})).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedShape));
    }

    #[test]
    fn test_rejects_non_list_industries() {
        let err = parse_catalog(json!({"industries": {}, "formats": []})).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedShape));
    }

    #[test]
    fn test_rejects_duplicate_format_ids() {
        let err = parse_catalog(json!({
            "industries": [],
            "formats": [
                {"id": "text", "label": "A", "subOptions": []},
                {"id": "text", "label": "B", "subOptions": []}
            ]
        }))
        .unwrap_err();
        match err {
            CatalogError::DuplicateKey { kind, key, .. } => {
                assert_eq!(kind, "format");
                assert_eq!(key, "text");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_duplicate_items_within_field() {
        let err = parse_catalog(json!({
            "industries": [],
            "formats": [],
            "common": {"fields": [{
                "id": "tone", "label": "Тон", "type": "list",
                "items": [{"value": "a"}, {"value": "a"}]
            }]}
        }))
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { kind: "item value", .. }));
    }

    #[test]
    fn test_same_expert_name_allowed_in_different_industries() {
        let result = parse_catalog(json!({
            "industries": [
                {"name": "Retail", "experts": [{"name": "Analyst"}]},
                {"name": "Banking", "experts": [{"name": "Analyst"}]}
            ],
            "formats": []
        }));
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_replace_persists_and_swaps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = CatalogStore::with_catalog(&path, Catalog::default());

        let before = store.current().await;
        store
            .replace(json!({
                "industries": [{"name": "Retail", "experts": []}],
                "formats": [{"id": "text", "label": "Текст", "subOptions": []}]
            }))
            .await
            .unwrap();

        assert!(before.industries.is_empty(), "old snapshot is untouched");
        assert_eq!(store.current().await.industries[0].name, "Retail");

        let reopened = CatalogStore::open(&path).await.unwrap();
        assert_eq!(reopened.current().await.formats[0].id, "text");
    }

    #[tokio::test]
    async fn test_invalid_replace_keeps_current_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = CatalogStore::with_catalog(&path, Catalog::default());

        assert!(store.replace(json!({"formats": []})).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_replaces_leave_file_and_cache_in_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = Arc::new(CatalogStore::with_catalog(&path, Catalog::default()));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .replace(json!({
                            "industries": [{"name": format!("I{i}"), "experts": []}],
                            "formats": []
                        }))
                        .await
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        let cached = store.current().await.industries[0].name.clone();
        let on_disk = CatalogStore::open(&path).await.unwrap();
        assert_eq!(on_disk.current().await.industries[0].name, cached);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_replace_keeps_unknown_keys_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = CatalogStore::with_catalog(&path, Catalog::default());

        store
            .replace(json!({"industries": [], "formats": [], "notes": "admin memo"}))
            .await
            .unwrap();

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["notes"], "admin memo");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("config.json");

        assert!(seed_catalog_file(&path).await.unwrap());
        assert!(!seed_catalog_file(&path).await.unwrap());
        assert!(CatalogStore::open(&path).await.is_ok());
    }
}
