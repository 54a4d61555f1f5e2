//! URL redirects: stored as a small JSON document per redirect, keyed by
//! the sanitized source path.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{require_id, required_str, rest_list, sanitize_handle, Item, Resource};

pub struct Redirects;

const LIST_PATH: &str = "/redirects.json?limit=250";

fn map_redirect(raw: &Value) -> Result<Item, SyncError> {
    let path = required_str(raw, "path")?;
    let target = required_str(raw, "target")?;
    let content = serde_json::to_string_pretty(&json!({
        "path": path,
        "target": target,
    }))?;
    Ok(Item {
        id: raw.get("id").map(|id| id.to_string()),
        handle: sanitize_handle(&path),
        content,
        meta: json!({ "id": raw.get("id").cloned().unwrap_or(Value::Null) }),
    })
}

fn redirect_payload(item: &Item) -> Result<Value, SyncError> {
    let doc: Value = serde_json::from_str(&item.content)?;
    Ok(json!({
        "redirect": {
            "path": required_str(&doc, "path")?,
            "target": required_str(&doc, "target")?,
        }
    }))
}

#[async_trait]
impl Resource for Redirects {
    fn name(&self) -> &'static str {
        "redirects"
    }

    fn ext(&self) -> &'static str {
        "json"
    }

    async fn list(
        &self,
        client: &StoreClient,
        policy: &RetryPolicy,
        max_items: Option<usize>,
    ) -> Result<Vec<Item>, SyncError> {
        rest_list(client, policy, LIST_PATH, "redirects", max_items, map_redirect).await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let payload = redirect_payload(item)?;
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                client.put(&format!("/redirects/{id}.json"), &payload).await?;
            }
            None => {
                client.post("/redirects.json", &payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        client.delete(&format!("/redirects/{id}.json")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_key_is_sanitized_path() {
        let raw = json!({ "id": 3, "path": "/old/url", "target": "/new-url" });
        let item = map_redirect(&raw).unwrap();
        assert_eq!(item.handle, "old_url");
        let payload = redirect_payload(&item).unwrap();
        assert_eq!(payload["redirect"]["path"], "/old/url");
        assert_eq!(payload["redirect"]["target"], "/new-url");
    }
}
