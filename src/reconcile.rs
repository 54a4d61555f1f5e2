//! Mirror-mode set reconciliation.
//!
//! Deletion sets are plain set differences over stable item keys. Key
//! derivation must be pure and deterministic so an item pulled then pushed
//! unmodified round-trips to the same key. Deletions are always computed
//! from a complete listing; callers never pass a capped or partial set.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SyncError;

/// Remote items whose key is absent locally (push-mirror direction).
///
/// An empty remote listing trivially yields an empty deletion set.
pub fn compute_deletions<'a, T, K>(
    local_keys: &HashSet<String>,
    remote_items: &'a [T],
    key_of: K,
) -> Vec<&'a T>
where
    K: Fn(&T) -> String,
{
    remote_items
        .iter()
        .filter(|item| !local_keys.contains(&key_of(item)))
        .collect()
}

/// Local keys absent from the remote set (pull-mirror direction), sorted
/// for stable deletion order.
pub fn local_only(local_keys: &HashSet<String>, remote_keys: &HashSet<String>) -> Vec<String> {
    let mut extra: Vec<String> = local_keys.difference(remote_keys).cloned().collect();
    extra.sort();
    extra
}

/// Path of the sidecar metadata file associated with a primary file.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".meta");
    path.with_file_name(name)
}

/// Deletes a primary file together with its sidecar, if one exists.
///
/// Returns the number of files removed. A missing sidecar is not an error;
/// a missing primary file removes nothing.
pub fn delete_with_sidecar(path: &Path) -> Result<usize, SyncError> {
    let mut removed = 0;
    if path.exists() {
        fs::remove_file(path)?;
        removed += 1;
    }
    let sidecar = sidecar_path(path);
    if sidecar.exists() {
        fs::remove_file(&sidecar)?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn keys(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn push_mirror_deletes_remote_only_items() {
        let local = keys(&["a", "b"]);
        let remote = vec!["a".to_string(), "c".to_string(), "d".to_string()];
        let deletions = compute_deletions(&local, &remote, |item| item.clone());
        assert_eq!(deletions, vec![&"c".to_string(), &"d".to_string()]);
    }

    #[test]
    fn pull_mirror_deletes_local_only_items() {
        let local = keys(&["a", "c", "d"]);
        let remote = keys(&["a", "b"]);
        assert_eq!(local_only(&local, &remote), vec!["c", "d"]);
    }

    #[test]
    fn empty_remote_listing_deletes_nothing_on_push() {
        let local = keys(&["a", "b"]);
        let remote: Vec<String> = Vec::new();
        assert!(compute_deletions(&local, &remote, |item| item.clone()).is_empty());
    }

    #[test]
    fn sidecar_path_appends_meta_suffix() {
        assert_eq!(
            sidecar_path(Path::new("/store/pages/about.html")),
            PathBuf::from("/store/pages/about.html.meta")
        );
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("storesync-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn delete_removes_primary_and_sidecar() {
        let dir = scratch_dir("sidecar");
        let primary = dir.join("about.html");
        File::create(&primary).unwrap();
        File::create(sidecar_path(&primary)).unwrap();
        assert_eq!(delete_with_sidecar(&primary).unwrap(), 2);
        assert!(!primary.exists());
        assert!(!sidecar_path(&primary).exists());
    }

    #[test]
    fn delete_without_sidecar_does_not_error() {
        let dir = scratch_dir("bare");
        let primary = dir.join("contact.html");
        File::create(&primary).unwrap();
        assert_eq!(delete_with_sidecar(&primary).unwrap(), 1);
    }
}
