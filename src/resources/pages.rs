//! Store pages: HTML body plus a YAML sidecar for title and publishing
//! fields.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{require_id, required_str, rest_list, Item, Resource};

pub struct Pages;

const LIST_PATH: &str = "/pages.json?limit=250";

fn map_page(raw: &Value) -> Result<Item, SyncError> {
    let handle = required_str(raw, "handle")?;
    let meta = json!({
        "id": raw.get("id").cloned().unwrap_or(Value::Null),
        "title": raw.get("title").cloned().unwrap_or(Value::Null),
        "author": raw.get("author").cloned().unwrap_or(Value::Null),
        "published_at": raw.get("published_at").cloned().unwrap_or(Value::Null),
        "template_suffix": raw.get("template_suffix").cloned().unwrap_or(Value::Null),
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

fn page_payload(item: &Item) -> Value {
    json!({
        "page": {
            "handle": item.handle,
            "title": item.meta.get("title").cloned().unwrap_or_else(|| Value::String(item.handle.clone())),
            "body_html": item.content,
            "author": item.meta.get("author").cloned().unwrap_or(Value::Null),
            "published_at": item.meta.get("published_at").cloned().unwrap_or(Value::Null),
            "template_suffix": item.meta.get("template_suffix").cloned().unwrap_or(Value::Null),
        }
    })
}

#[async_trait]
impl Resource for Pages {
    fn name(&self) -> &'static str {
        "pages"
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
        rest_list(client, policy, LIST_PATH, "pages", max_items, map_page).await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let payload = page_payload(item);
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                client.put(&format!("/pages/{id}.json"), &payload).await?;
            }
            None => {
                client.post("/pages.json", &payload).await?;
            }
        }
        Ok(())
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        client.delete(&format!("/pages/{id}.json")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_page_round_trips_handle_and_body() {
        let raw = json!({
            "id": 7,
            "handle": "about",
            "title": "About us",
            "body_html": "<p>hi</p>",
            "author": "jo",
        });
        let item = map_page(&raw).unwrap();
        assert_eq!(item.handle, "about");
        assert_eq!(item.content, "<p>hi</p>");
        assert_eq!(item.meta["id"], 7);

        let payload = page_payload(&item);
        assert_eq!(payload["page"]["handle"], "about");
        assert_eq!(payload["page"]["body_html"], "<p>hi</p>");
        assert_eq!(payload["page"]["title"], "About us");
    }

    #[test]
    fn map_page_requires_handle() {
        assert!(map_page(&json!({ "id": 1 })).is_err());
    }
}
