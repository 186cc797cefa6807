//! Source discovery over a directory manifest tree.
//!
//! Each directory may carry a `urls.json` (flat array of URL strings) and a
//! `manifest.json` whose `children` array names relative child directories
//! to recurse into. Traversal is order-preserving and cycle-safe; every
//! individual read or parse failure degrades to an empty branch rather than
//! aborting the walk.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde_json::Value;

/// File naming this directory's source URLs.
const URLS_FILE: &str = "urls.json";

/// File naming this directory's child directories.
const MANIFEST_FILE: &str = "manifest.json";

/// Recursively gather source URLs from `start_dir` and its manifest
/// children, in discovery order.
pub async fn collect_sources(start_dir: &Path) -> Vec<String> {
    let mut seen = HashSet::new();
    collect_dir(start_dir.to_path_buf(), &mut seen).await
}

fn collect_dir<'a>(
    dir: PathBuf, seen: &'a mut HashSet<PathBuf>,
) -> Pin<Box<dyn Future<Output = Vec<String>> + Send + 'a>> {
    Box::pin(async move {
        let mut out = Vec::new();

        // Canonicalize so symlinked or dotted paths share one identity.
        let dir_id = tokio::fs::canonicalize(&dir).await.unwrap_or_else(|_| dir.clone());
        if !seen.insert(dir_id) {
            tracing::debug!("already visited {}, skipping", dir.display());
            return out;
        }

        if let Some(Value::Array(urls)) = read_json_maybe(&dir.join(URLS_FILE)).await {
            for entry in urls {
                if let Value::String(url) = entry {
                    let trimmed = url.trim();
                    if !trimmed.is_empty() {
                        out.push(trimmed.to_string());
                    }
                }
            }
        }

        let children: Vec<Value> = match read_json_maybe(&dir.join(MANIFEST_FILE)).await {
            Some(manifest) => manifest
                .get("children")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            None => Vec::new(),
        };

        for child in children {
            let Some(name) = child.as_str() else { continue };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            out.extend(collect_dir(dir.join(name), seen).await);
        }

        out
    })
}

/// Read and parse a JSON file, degrading to None on any failure.
async fn read_json_maybe(path: &Path) -> Option<Value> {
    let bytes = tokio::fs::read(path).await.ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_urls(dir: &Path, urls: &[&str]) {
        fs::write(dir.join(URLS_FILE), serde_json::to_string(urls).unwrap()).unwrap();
    }

    fn write_manifest(dir: &Path, children: &[&str]) {
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::json!({ "children": children }).to_string(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_flat_directory() {
        let root = tempfile::tempdir().unwrap();
        write_urls(root.path(), &["https://example.org/wiki/A", "https://example.org/wiki/B"]);

        let sources = collect_sources(root.path()).await;
        assert_eq!(sources, vec!["https://example.org/wiki/A", "https://example.org/wiki/B"]);
    }

    #[tokio::test]
    async fn test_recursion_preserves_order() {
        let root = tempfile::tempdir().unwrap();
        write_urls(root.path(), &["https://example.org/wiki/Top"]);
        write_manifest(root.path(), &["first", "second"]);

        for (child, url) in [("first", "https://example.org/wiki/First"), ("second", "https://example.org/wiki/Second")]
        {
            let dir = root.path().join(child);
            fs::create_dir(&dir).unwrap();
            write_urls(&dir, &[url]);
        }

        let sources = collect_sources(root.path()).await;
        assert_eq!(
            sources,
            vec![
                "https://example.org/wiki/Top",
                "https://example.org/wiki/First",
                "https://example.org/wiki/Second",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_files_yield_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(collect_sources(root.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_degrades_to_empty() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(URLS_FILE), "not json").unwrap();
        fs::write(root.path().join(MANIFEST_FILE), "[broken").unwrap();
        assert!(collect_sources(root.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_string_entries_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(URLS_FILE),
            r#"["https://example.org/wiki/A", 42, null, "  ", "https://example.org/wiki/B"]"#,
        )
        .unwrap();

        let sources = collect_sources(root.path()).await;
        assert_eq!(sources, vec!["https://example.org/wiki/A", "https://example.org/wiki/B"]);
    }

    #[tokio::test]
    async fn test_self_cycle_terminates_without_duplicates() {
        let root = tempfile::tempdir().unwrap();
        write_urls(root.path(), &["https://example.org/wiki/Loop"]);
        write_manifest(root.path(), &["."]);

        let sources = collect_sources(root.path()).await;
        assert_eq!(sources, vec!["https://example.org/wiki/Loop"]);
    }

    #[tokio::test]
    async fn test_mutual_cycle_terminates_without_duplicates() {
        let root = tempfile::tempdir().unwrap();
        let a = root.path().join("a");
        let b = a.join("b");
        fs::create_dir_all(&b).unwrap();

        write_manifest(root.path(), &["a"]);
        write_urls(&a, &["https://example.org/wiki/A"]);
        write_manifest(&a, &["b"]);
        write_urls(&b, &["https://example.org/wiki/B"]);
        // b points back up at a.
        write_manifest(&b, &[".."]);

        let sources = collect_sources(root.path()).await;
        assert_eq!(sources, vec!["https://example.org/wiki/A", "https://example.org/wiki/B"]);
    }
}
