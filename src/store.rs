//! Local directory tree for synced resources.
//!
//! Layout is `<root>/<resource>/<handle>.<ext>` with an optional
//! `<handle>.<ext>.meta` YAML sidecar for fields the primary content
//! format cannot carry. Handles may contain `/`, which maps to
//! subdirectories (blog articles live under their blog's handle).

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SyncError;
use crate::reconcile::{delete_with_sidecar, sidecar_path};

#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resource_dir(&self, resource: &str) -> PathBuf {
        self.root.join(resource)
    }

    pub fn ensure_resource_dir(&self, resource: &str) -> Result<PathBuf, SyncError> {
        let dir = self.resource_dir(resource);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn item_path(&self, resource: &str, handle: &str, ext: &str) -> PathBuf {
        self.resource_dir(resource).join(format!("{handle}.{ext}"))
    }

    /// Enumerates handles of all items stored for `resource`, walking
    /// subdirectories. Sidecars and files with a different extension are
    /// skipped. A missing resource directory yields an empty listing.
    pub fn list_handles(&self, resource: &str, ext: &str) -> Result<Vec<String>, SyncError> {
        let dir = self.resource_dir(resource);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut handles = Vec::new();
        collect_handles(&dir, &dir, ext, &mut handles)?;
        handles.sort();
        Ok(handles)
    }

    pub fn read_content(&self, resource: &str, handle: &str, ext: &str) -> Result<String, SyncError> {
        let path = self.item_path(resource, handle, ext);
        fs::read_to_string(&path)
            .map_err(|err| SyncError::Io(format!("{}: {err}", path.display())))
    }

    /// Reads the sidecar for an item, if one exists.
    pub fn read_meta<M: DeserializeOwned>(
        &self,
        resource: &str,
        handle: &str,
        ext: &str,
    ) -> Result<Option<M>, SyncError> {
        let path = sidecar_path(&self.item_path(resource, handle, ext));
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_yaml::from_str(&contents)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes an item's content and, when given, its YAML sidecar.
    /// Parent directories are created as needed.
    pub fn write_item<M: Serialize>(
        &self,
        resource: &str,
        handle: &str,
        ext: &str,
        content: &str,
        meta: Option<&M>,
    ) -> Result<PathBuf, SyncError> {
        let path = self.item_path(resource, handle, ext);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        if let Some(meta) = meta {
            fs::write(sidecar_path(&path), serde_yaml::to_string(meta)?)?;
        }
        Ok(path)
    }

    /// Deletes an item and its sidecar; returns the number of files
    /// removed.
    pub fn delete_item(&self, resource: &str, handle: &str, ext: &str) -> Result<usize, SyncError> {
        delete_with_sidecar(&self.item_path(resource, handle, ext))
    }
}

fn collect_handles(
    base: &Path,
    dir: &Path,
    ext: &str,
    handles: &mut Vec<String>,
) -> Result<(), SyncError> {
    let suffix = format!(".{ext}");
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_handles(base, &path, ext, handles)?;
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".meta") || !name.ends_with(&suffix) {
            continue;
        }
        let rel = path.strip_prefix(base).unwrap_or(&path);
        let rel = rel.to_string_lossy().replace('\\', "/");
        handles.push(rel[..rel.len() - suffix.len()].to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Meta {
        id: u64,
        title: String,
    }

    fn scratch_store(name: &str) -> LocalStore {
        let root = std::env::temp_dir().join(format!("storesync-store-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        LocalStore::new(root)
    }

    #[test]
    fn write_then_list_then_read_round_trips() {
        let store = scratch_store("roundtrip");
        let meta = Meta {
            id: 7,
            title: "About us".into(),
        };
        store
            .write_item("pages", "about", "html", "<p>hello</p>", Some(&meta))
            .unwrap();
        assert_eq!(store.list_handles("pages", "html").unwrap(), vec!["about"]);
        assert_eq!(store.read_content("pages", "about", "html").unwrap(), "<p>hello</p>");
        assert_eq!(
            store.read_meta::<Meta>("pages", "about", "html").unwrap(),
            Some(meta)
        );
    }

    #[test]
    fn list_skips_sidecars_and_walks_subdirectories() {
        let store = scratch_store("walk");
        store
            .write_item("blogs", "news/launch", "html", "<p>go</p>", Some(&Meta { id: 1, title: "Launch".into() }))
            .unwrap();
        store
            .write_item::<Meta>("blogs", "news/update", "html", "<p>more</p>", None)
            .unwrap();
        assert_eq!(
            store.list_handles("blogs", "html").unwrap(),
            vec!["news/launch", "news/update"]
        );
    }

    #[test]
    fn missing_resource_dir_lists_empty() {
        let store = scratch_store("empty");
        assert!(store.list_handles("pages", "html").unwrap().is_empty());
    }

    #[test]
    fn missing_meta_reads_as_none() {
        let store = scratch_store("nometa");
        store
            .write_item::<Meta>("pages", "bare", "html", "x", None)
            .unwrap();
        assert_eq!(store.read_meta::<Meta>("pages", "bare", "html").unwrap(), None);
    }

    #[test]
    fn delete_item_removes_content_and_sidecar() {
        let store = scratch_store("delete");
        store
            .write_item("pages", "old", "html", "x", Some(&Meta { id: 2, title: "Old".into() }))
            .unwrap();
        assert_eq!(store.delete_item("pages", "old", "html").unwrap(), 2);
        assert!(store.list_handles("pages", "html").unwrap().is_empty());
    }
}
