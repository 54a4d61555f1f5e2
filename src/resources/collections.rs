//! Custom collections: HTML description plus title and ordering in the
//! sidecar.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{require_id, required_str, rest_list, Item, Resource};

pub struct Collections;

const LIST_PATH: &str = "/custom_collections.json?limit=250";

fn map_collection(raw: &Value) -> Result<Item, SyncError> {
    let handle = required_str(raw, "handle")?;
    let meta = json!({
        "id": raw.get("id").cloned().unwrap_or(Value::Null),
        "title": raw.get("title").cloned().unwrap_or(Value::Null),
        "sort_order": raw.get("sort_order").cloned().unwrap_or(Value::Null),
        "published_at": raw.get("published_at").cloned().unwrap_or(Value::Null),
    });
    Ok(Item {
        id: raw.get("id").map(|id| id.to_string()),
        handle,
        content: raw
            .get("body_html")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        meta,
    })
}

fn collection_payload(item: &Item) -> Value {
    json!({
        "custom_collection": {
            "handle": item.handle,
            "title": item.meta.get("title").cloned().unwrap_or_else(|| Value::String(item.handle.clone())),
            "body_html": item.content,
            "sort_order": item.meta.get("sort_order").cloned().unwrap_or(Value::Null),
            "published_at": item.meta.get("published_at").cloned().unwrap_or(Value::Null),
        }
    })
}

#[async_trait]
impl Resource for Collections {
    fn name(&self) -> &'static str {
        "collections"
    }

    fn ext(&self) -> &'static str {
        "html"
    }

    async fn list(
        &self,
        client: &StoreClient,
        policy: &RetryPolicy,
        max_items: Option<usize>,
    ) -> Result<Vec<Item>, SyncError> {
        rest_list(
            client,
            policy,
            LIST_PATH,
            "custom_collections",
            max_items,
            map_collection,
        )
        .await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let payload = collection_payload(item);
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                client
                    .put(&format!("/custom_collections/{id}.json"), &payload)
                    .await?;
            }
            None => {
                client.post("/custom_collections.json", &payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        client
            .delete(&format!("/custom_collections/{id}.json"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_collection_round_trips() {
        let raw = json!({
            "id": 5,
            "handle": "summer",
            "title": "Summer",
            "body_html": "<p>sun</p>",
            "sort_order": "best-selling",
        });
        let item = map_collection(&raw).unwrap();
        let payload = collection_payload(&item);
        assert_eq!(payload["custom_collection"]["handle"], "summer");
        assert_eq!(payload["custom_collection"]["sort_order"], "best-selling");
    }
}
