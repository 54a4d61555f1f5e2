//! Per-resource pull/push plumbing.
//!
//! Each resource adapts its endpoints and wire shapes to the shared
//! [`Item`] model; the sync orchestration and the mirror reconciliation
//! never look past `Item`. REST resources paginate via `Link` headers,
//! GraphQL resources via connection cursors, both through the same
//! [`crate::pagination::fetch_all`] loop.

use async_trait::async_trait;
use serde_json::Value;

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::pagination::{fetch_all, Page, PageInfo};
use crate::resilience::RetryPolicy;

pub mod blogs;
pub mod collections;
pub mod files;
pub mod menus;
pub mod metafields;
pub mod metaobjects;
pub mod pages;
pub mod products;
pub mod redirects;
pub mod webhooks;

pub use blogs::Blogs;
pub use collections::Collections;
pub use files::Files;
pub use menus::Menus;
pub use metafields::Metafields;
pub use metaobjects::Metaobjects;
pub use pages::Pages;
pub use products::Products;
pub use redirects::Redirects;
pub use webhooks::Webhooks;

/// One synced item, local or remote.
///
/// `handle` is the stable reconciliation key and the local filename stem;
/// deriving it from the wire item must be pure and deterministic so a
/// pull/push round-trip lands on the same key. `meta` holds the sidecar
/// fields (always including the remote `id` for items that exist
/// remotely).
#[derive(Clone, Debug)]
pub struct Item {
    pub id: Option<String>,
    pub handle: String,
    pub content: String,
    pub meta: Value,
}

/// A resource type's endpoints and wire mapping.
#[async_trait]
pub trait Resource {
    /// Subdirectory name and CLI label
    fn name(&self) -> &'static str;

    /// Primary file extension
    fn ext(&self) -> &'static str;

    /// Full remote listing (capped only when `max_items` is given).
    async fn list(
        &self,
        client: &StoreClient,
        policy: &RetryPolicy,
        max_items: Option<usize>,
    ) -> Result<Vec<Item>, SyncError>;

    /// Creates or updates one remote item.
    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError>;

    /// Deletes one remote item.
    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError>;
}

/// Walks a REST listing whose pages chain through `Link: rel="next"`.
pub(crate) async fn rest_list(
    client: &StoreClient,
    policy: &RetryPolicy,
    first_path: &str,
    root_key: &str,
    max_items: Option<usize>,
    map: fn(&Value) -> Result<Item, SyncError>,
) -> Result<Vec<Item>, SyncError> {
    fetch_all(
        |cursor| async move {
            let path = cursor.unwrap_or_else(|| first_path.to_string());
            let response = client.get(&path).await?;
            let raw = response
                .body
                .get(root_key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let items = raw.iter().map(map).collect::<Result<Vec<_>, _>>()?;
            Ok(Page {
                items,
                next_cursor: response.next_link,
            })
        },
        max_items,
        policy,
    )
    .await
}

/// Walks a GraphQL connection whose pages chain through
/// `pageInfo.endCursor`.
pub(crate) async fn graphql_list(
    client: &StoreClient,
    policy: &RetryPolicy,
    query: &'static str,
    connection_key: &str,
    extra_variables: Value,
    max_items: Option<usize>,
    map: fn(&Value) -> Result<Item, SyncError>,
) -> Result<Vec<Item>, SyncError> {
    fetch_all(
        |cursor| {
            let variables = merge_variables(&extra_variables, cursor);
            async move {
                let data = client.graphql(query, variables).await?;
                let connection = data.get(connection_key).cloned().unwrap_or(Value::Null);
                let nodes = connection
                    .get("edges")
                    .and_then(Value::as_array)
                    .map(|edges| {
                        edges
                            .iter()
                            .filter_map(|edge| edge.get("node"))
                            .cloned()
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                let items = nodes.iter().map(map).collect::<Result<Vec<_>, _>>()?;
                let page_info: PageInfo = match connection.get("pageInfo") {
                    Some(info) => serde_json::from_value(info.clone())?,
                    None => PageInfo {
                        has_next_page: false,
                        end_cursor: None,
                    },
                };
                Ok(Page {
                    items,
                    next_cursor: page_info.next_cursor(),
                })
            }
        },
        max_items,
        policy,
    )
    .await
}

const GRAPHQL_PAGE_SIZE: u32 = 100;

fn merge_variables(extra: &Value, cursor: Option<String>) -> Value {
    let mut variables = serde_json::json!({
        "first": GRAPHQL_PAGE_SIZE,
        "after": cursor,
    });
    if let (Some(target), Some(source)) = (variables.as_object_mut(), extra.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    variables
}

/// Remote identity from an item's sidecar, tolerating numeric REST ids
/// and string GraphQL gids.
pub(crate) fn id_from_meta(meta: &Value) -> Option<String> {
    match meta.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Identity for a remote mutation; items that exist remotely always
/// carry one.
pub(crate) fn require_id(item: &Item) -> Result<String, SyncError> {
    item.id
        .clone()
        .or_else(|| id_from_meta(&item.meta))
        .ok_or_else(|| {
            SyncError::Validation(format!("item '{}' has no remote id", item.handle))
        })
}

pub(crate) fn required_str(value: &Value, key: &str) -> Result<String, SyncError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
        .ok_or_else(|| SyncError::Json(format!("missing field '{key}' in API payload")))
}

/// Turns an arbitrary identifier (redirect path, webhook topic) into a
/// filename-safe handle. Deterministic so the key round-trips.
pub(crate) fn sanitize_handle(raw: &str) -> String {
    raw.trim_matches('/')
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Maps a mutation payload's `userErrors` to a permanent validation
/// failure.
pub(crate) fn check_user_errors(payload: &Value, mutation: &str) -> Result<(), SyncError> {
    match crate::client::user_errors(payload) {
        Some(errors) => Err(SyncError::Validation(format!("{mutation}: {errors}"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_handle_is_deterministic_and_safe() {
        assert_eq!(sanitize_handle("/old/path"), "old_path");
        assert_eq!(sanitize_handle("orders/create"), "orders_create");
        assert_eq!(sanitize_handle("plain"), "plain");
        assert_eq!(sanitize_handle("/old/path"), sanitize_handle("/old/path"));
    }

    #[test]
    fn id_from_meta_accepts_numbers_and_strings() {
        assert_eq!(
            id_from_meta(&serde_json::json!({ "id": 42 })).as_deref(),
            Some("42")
        );
        assert_eq!(
            id_from_meta(&serde_json::json!({ "id": "gid://x/Menu/1" })).as_deref(),
            Some("gid://x/Menu/1")
        );
        assert_eq!(id_from_meta(&serde_json::json!({})), None);
    }

    #[test]
    fn merge_variables_layers_extra_over_paging() {
        let vars = merge_variables(&serde_json::json!({ "type": "faq" }), Some("c1".into()));
        assert_eq!(vars["first"], GRAPHQL_PAGE_SIZE);
        assert_eq!(vars["after"], "c1");
        assert_eq!(vars["type"], "faq");
    }
}
