//! Products: HTML description plus a sidecar carrying the catalog fields.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{require_id, required_str, rest_list, Item, Resource};

pub struct Products;

const LIST_PATH: &str = "/products.json?limit=250";

fn map_product(raw: &Value) -> Result<Item, SyncError> {
    let handle = required_str(raw, "handle")?;
    let meta = json!({
        "id": raw.get("id").cloned().unwrap_or(Value::Null),
        "title": raw.get("title").cloned().unwrap_or(Value::Null),
        "vendor": raw.get("vendor").cloned().unwrap_or(Value::Null),
        "product_type": raw.get("product_type").cloned().unwrap_or(Value::Null),
        "tags": raw.get("tags").cloned().unwrap_or(Value::Null),
        "status": raw.get("status").cloned().unwrap_or(Value::Null),
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

fn product_payload(item: &Item) -> Value {
    json!({
        "product": {
            "handle": item.handle,
            "title": item.meta.get("title").cloned().unwrap_or_else(|| Value::String(item.handle.clone())),
            "body_html": item.content,
            "vendor": item.meta.get("vendor").cloned().unwrap_or(Value::Null),
            "product_type": item.meta.get("product_type").cloned().unwrap_or(Value::Null),
            "tags": item.meta.get("tags").cloned().unwrap_or(Value::Null),
            "status": item.meta.get("status").cloned().unwrap_or(Value::Null),
        }
    })
}

#[async_trait]
impl Resource for Products {
    fn name(&self) -> &'static str {
        "products"
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
        rest_list(client, policy, LIST_PATH, "products", max_items, map_product).await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let payload = product_payload(item);
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                client.put(&format!("/products/{id}.json"), &payload).await?;
            }
            None => {
                client.post("/products.json", &payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        client.delete(&format!("/products/{id}.json")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_product_keeps_catalog_fields_in_meta() {
        let raw = json!({
            "id": 11,
            "handle": "blue-shirt",
            "title": "Blue shirt",
            "body_html": "<p>soft</p>",
            "vendor": "acme",
            "status": "active",
        });
        let item = map_product(&raw).unwrap();
        assert_eq!(item.handle, "blue-shirt");
        assert_eq!(item.meta["vendor"], "acme");
        let payload = product_payload(&item);
        assert_eq!(payload["product"]["status"], "active");
        assert_eq!(payload["product"]["body_html"], "<p>soft</p>");
    }
}
