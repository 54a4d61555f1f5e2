//! Webhook subscriptions, keyed by topic.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{require_id, required_str, rest_list, Item, Resource};

pub struct Webhooks;

const LIST_PATH: &str = "/webhooks.json?limit=250";

/// Topics read `orders/create`; the slash maps to a dot so the key stays
/// a flat filename.
fn topic_to_handle(topic: &str) -> String {
    topic.replace('/', ".")
}

fn map_webhook(raw: &Value) -> Result<Item, SyncError> {
    let topic = required_str(raw, "topic")?;
    let content = serde_json::to_string_pretty(&json!({
        "topic": topic,
        "address": required_str(raw, "address")?,
        "format": raw.get("format").cloned().unwrap_or_else(|| Value::String("json".into())),
    }))?;
    Ok(Item {
        id: raw.get("id").map(|id| id.to_string()),
        handle: topic_to_handle(&topic),
        content,
        meta: json!({ "id": raw.get("id").cloned().unwrap_or(Value::Null) }),
    })
}

fn webhook_payload(item: &Item) -> Result<Value, SyncError> {
    let doc: Value = serde_json::from_str(&item.content)?;
    Ok(json!({
        "webhook": {
            "topic": required_str(&doc, "topic")?,
            "address": required_str(&doc, "address")?,
            "format": doc.get("format").cloned().unwrap_or_else(|| Value::String("json".into())),
        }
    }))
}

#[async_trait]
impl Resource for Webhooks {
    fn name(&self) -> &'static str {
        "webhooks"
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
        rest_list(client, policy, LIST_PATH, "webhooks", max_items, map_webhook).await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let payload = webhook_payload(item)?;
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                client.put(&format!("/webhooks/{id}.json"), &payload).await?;
            }
            None => {
                client.post("/webhooks.json", &payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        client.delete(&format!("/webhooks/{id}.json")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_key_is_dotted_topic() {
        let raw = json!({
            "id": 9,
            "topic": "orders/create",
            "address": "https://hooks.example.com/orders",
        });
        let item = map_webhook(&raw).unwrap();
        assert_eq!(item.handle, "orders.create");
        let payload = webhook_payload(&item).unwrap();
        assert_eq!(payload["webhook"]["topic"], "orders/create");
        assert_eq!(payload["webhook"]["format"], "json");
    }
}
