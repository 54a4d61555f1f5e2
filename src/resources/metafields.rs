//! Shop-level metafields, keyed by `namespace.key`. The raw value is the
//! primary file; namespace, key, and type live in the sidecar.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{require_id, required_str, rest_list, Item, Resource};

pub struct Metafields;

const LIST_PATH: &str = "/metafields.json?limit=250";

fn map_metafield(raw: &Value) -> Result<Item, SyncError> {
    let namespace = required_str(raw, "namespace")?;
    let key = required_str(raw, "key")?;
    let value = match raw.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    Ok(Item {
        id: raw.get("id").map(|id| id.to_string()),
        handle: format!("{namespace}.{key}"),
        content: value,
        meta: json!({
            "id": raw.get("id").cloned().unwrap_or(Value::Null),
            "namespace": namespace,
            "key": key,
            "type": raw.get("type").cloned().unwrap_or(Value::Null),
        }),
    })
}

fn metafield_payload(item: &Item) -> Result<Value, SyncError> {
    let namespace = required_str(&item.meta, "namespace").map_err(|_| {
        SyncError::Validation(format!(
            "metafield '{}' sidecar is missing the required field 'namespace'",
            item.handle
        ))
    })?;
    let key = required_str(&item.meta, "key").map_err(|_| {
        SyncError::Validation(format!(
            "metafield '{}' sidecar is missing the required field 'key'",
            item.handle
        ))
    })?;
    Ok(json!({
        "metafield": {
            "namespace": namespace,
            "key": key,
            "type": item.meta.get("type").cloned().unwrap_or_else(|| Value::String("single_line_text_field".into())),
            "value": item.content,
        }
    }))
}

#[async_trait]
impl Resource for Metafields {
    fn name(&self) -> &'static str {
        "metafields"
    }

    fn ext(&self) -> &'static str {
        "txt"
    }

    async fn list(
        &self,
        client: &StoreClient,
        policy: &RetryPolicy,
        max_items: Option<usize>,
    ) -> Result<Vec<Item>, SyncError> {
        rest_list(client, policy, LIST_PATH, "metafields", max_items, map_metafield).await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let payload = metafield_payload(item)?;
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                client.put(&format!("/metafields/{id}.json"), &payload).await?;
            }
            None => {
                client.post("/metafields.json", &payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        client.delete(&format!("/metafields/{id}.json")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metafield_key_is_namespace_dot_key() {
        let raw = json!({
            "id": 21,
            "namespace": "seo",
            "key": "description",
            "type": "multi_line_text_field",
            "value": "Great store",
        });
        let item = map_metafield(&raw).unwrap();
        assert_eq!(item.handle, "seo.description");
        assert_eq!(item.content, "Great store");
        let payload = metafield_payload(&item).unwrap();
        assert_eq!(payload["metafield"]["namespace"], "seo");
        assert_eq!(payload["metafield"]["value"], "Great store");
    }

    #[test]
    fn payload_rejects_sidecar_without_namespace() {
        let item = Item {
            id: None,
            handle: "x".into(),
            content: "v".into(),
            meta: json!({}),
        };
        assert!(matches!(
            metafield_payload(&item),
            Err(SyncError::Validation(_))
        ));
    }
}
