//! Pull/push orchestration shared by every resource command.
//!
//! Items are processed one at a time; independent item failures are
//! tallied and reported at the end, while a listing failure or a missing
//! input directory aborts the whole command. Mirror deletions are only
//! ever computed from a complete listing.

use std::collections::HashSet;

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::reconcile::{compute_deletions, local_only};
use crate::resilience::{execute, RetryPolicy};
use crate::resources::{Item, Resource};
use crate::store::LocalStore;

#[derive(Clone, Debug, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub mirror: bool,
    pub max_items: Option<usize>,
}

/// Outcome of one pull or push invocation.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub transferred: usize,
    pub deleted: usize,
    pub failures: Vec<(String, SyncError)>,
}

/// Sidecar contents for a pulled item: the resource's meta fields plus
/// the sync timestamp. Items with no meta fields get no sidecar.
fn stamped_meta(meta: &serde_json::Value) -> Option<serde_json::Value> {
    if meta.is_null() {
        return None;
    }
    let mut stamped = meta.clone();
    if let Some(map) = stamped.as_object_mut() {
        map.insert(
            "synced_at".to_string(),
            serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
        );
    }
    Some(stamped)
}

/// Mirror deletions must be computed against the uncapped listing, so
/// sampling and mirroring cannot be combined.
fn validate(options: &SyncOptions) -> Result<(), SyncError> {
    if options.mirror && options.max_items.is_some() {
        return Err(SyncError::Config(
            "--mirror cannot be combined with --max-items".into(),
        ));
    }
    Ok(())
}

/// Downloads all remote items into the local store; with `mirror`, also
/// deletes local items (and their sidecars) absent remotely.
pub async fn pull<R: Resource>(
    resource: &R,
    client: &StoreClient,
    store: &LocalStore,
    policy: &RetryPolicy,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    validate(options)?;
    let name = resource.name();
    let ext = resource.ext();
    let items = resource.list(client, policy, options.max_items).await?;
    log::info!("{name}: fetched {} remote items", items.len());

    let mut report = SyncReport::default();
    if !options.dry_run {
        store.ensure_resource_dir(name)?;
    }
    let total = items.len();
    for (index, item) in items.iter().enumerate() {
        log::info!("[{}/{total}] {name}: pull '{}'", index + 1, item.handle);
        if options.dry_run {
            report.transferred += 1;
            continue;
        }
        let meta = stamped_meta(&item.meta);
        match store.write_item(name, &item.handle, ext, &item.content, meta.as_ref()) {
            Ok(_) => report.transferred += 1,
            Err(err) => report.failures.push((item.handle.clone(), err)),
        }
    }

    if options.mirror {
        let remote_keys: HashSet<String> = items.iter().map(|item| item.handle.clone()).collect();
        let local_keys: HashSet<String> =
            store.list_handles(name, ext)?.into_iter().collect();
        for handle in local_only(&local_keys, &remote_keys) {
            if options.dry_run {
                log::info!("{name}: would delete local '{handle}'");
                report.deleted += 1;
                continue;
            }
            match store.delete_item(name, &handle, ext) {
                Ok(removed) if removed > 0 => {
                    log::info!("{name}: deleted local '{handle}'");
                    report.deleted += 1;
                }
                Ok(_) => {}
                Err(err) => report.failures.push((handle, err)),
            }
        }
    }
    Ok(report)
}

/// Uploads all local items to the store; with `mirror`, also deletes
/// remote items absent locally.
pub async fn push<R: Resource>(
    resource: &R,
    client: &StoreClient,
    store: &LocalStore,
    policy: &RetryPolicy,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    validate(options)?;
    let name = resource.name();
    let ext = resource.ext();
    if !store.resource_dir(name).exists() {
        return Err(SyncError::Config(format!(
            "input directory {} does not exist",
            store.resource_dir(name).display()
        )));
    }

    let handles = store.list_handles(name, ext)?;
    let mut local_items = Vec::with_capacity(handles.len());
    for handle in handles {
        let content = store.read_content(name, &handle, ext)?;
        let meta = store
            .read_meta::<serde_json::Value>(name, &handle, ext)?
            .unwrap_or(serde_json::Value::Null);
        local_items.push(Item {
            id: None,
            handle,
            content,
            meta,
        });
    }

    let mut report = SyncReport::default();
    let total = local_items.len();
    for (index, item) in local_items.iter().enumerate() {
        log::info!("[{}/{total}] {name}: push '{}'", index + 1, item.handle);
        if options.dry_run {
            report.transferred += 1;
            continue;
        }
        match execute(|| resource.upsert(client, item), policy).await {
            Ok(()) => report.transferred += 1,
            Err(err) => report.failures.push((item.handle.clone(), err)),
        }
    }

    if options.mirror {
        let local_keys: HashSet<String> = local_items
            .iter()
            .map(|item| item.handle.clone())
            .collect();
        // full listing, never capped
        let remote_items = resource.list(client, policy, None).await?;
        let deletions = compute_deletions(&local_keys, &remote_items, |item| item.handle.clone());
        for item in deletions {
            if options.dry_run {
                log::info!("{name}: would delete remote '{}'", item.handle);
                report.deleted += 1;
                continue;
            }
            match execute(|| resource.delete_remote(client, item), policy).await {
                Ok(()) => {
                    log::info!("{name}: deleted remote '{}'", item.handle);
                    report.deleted += 1;
                }
                Err(err) => report.failures.push((item.handle.clone(), err)),
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_rejects_item_cap() {
        let options = SyncOptions {
            mirror: true,
            max_items: Some(10),
            ..Default::default()
        };
        assert!(matches!(validate(&options), Err(SyncError::Config(_))));
    }

    #[test]
    fn mirror_without_cap_is_valid() {
        let options = SyncOptions {
            mirror: true,
            ..Default::default()
        };
        assert!(validate(&options).is_ok());
    }
}
