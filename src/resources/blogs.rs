//! Blog articles, keyed `<blog-handle>/<article-handle>` so each blog
//! maps to a subdirectory. The article body is the HTML file; the blog
//! linkage and publishing fields live in the sidecar.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::pagination::{fetch_all, Page};
use crate::resilience::RetryPolicy;

use super::{required_str, Item, Resource};

pub struct Blogs;

const BLOGS_PATH: &str = "/blogs.json?limit=250";

async fn list_blogs(
    client: &StoreClient,
    policy: &RetryPolicy,
) -> Result<Vec<(String, String)>, SyncError> {
    fetch_all(
        |cursor| async move {
            let path = cursor.unwrap_or_else(|| BLOGS_PATH.to_string());
            let response = client.get(&path).await?;
            let blogs = response
                .body
                .get("blogs")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let items = blogs
                .iter()
                .map(|blog| {
                    let id = blog
                        .get("id")
                        .map(|id| id.to_string())
                        .ok_or_else(|| SyncError::Json("blog without id".into()))?;
                    Ok((id, required_str(blog, "handle")?))
                })
                .collect::<Result<Vec<_>, SyncError>>()?;
            Ok(Page {
                items,
                next_cursor: response.next_link,
            })
        },
        None,
        policy,
    )
    .await
}

fn map_article(blog_id: &str, blog_handle: &str, raw: &Value) -> Result<Item, SyncError> {
    let handle = required_str(raw, "handle")?;
    Ok(Item {
        id: raw.get("id").map(|id| id.to_string()),
        handle: format!("{blog_handle}/{handle}"),
        content: raw
            .get("body_html")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        meta: json!({
            "id": raw.get("id").cloned().unwrap_or(Value::Null),
            "blog_id": blog_id,
            "blog_handle": blog_handle,
            "title": raw.get("title").cloned().unwrap_or(Value::Null),
            "author": raw.get("author").cloned().unwrap_or(Value::Null),
            "tags": raw.get("tags").cloned().unwrap_or(Value::Null),
            "published_at": raw.get("published_at").cloned().unwrap_or(Value::Null),
        }),
    })
}

fn article_payload(item: &Item) -> Value {
    let article_handle = item
        .handle
        .rsplit_once('/')
        .map(|(_, article)| article)
        .unwrap_or(item.handle.as_str());
    json!({
        "article": {
            "handle": article_handle,
            "title": item.meta.get("title").cloned().unwrap_or_else(|| Value::String(article_handle.to_string())),
            "body_html": item.content,
            "author": item.meta.get("author").cloned().unwrap_or(Value::Null),
            "tags": item.meta.get("tags").cloned().unwrap_or(Value::Null),
            "published_at": item.meta.get("published_at").cloned().unwrap_or(Value::Null),
        }
    })
}

fn blog_id_of(item: &Item) -> Result<String, SyncError> {
    match item.meta.get("blog_id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(SyncError::Validation(format!(
            "article '{}' sidecar is missing the required field 'blog_id'",
            item.handle
        ))),
    }
}

#[async_trait]
impl Resource for Blogs {
    fn name(&self) -> &'static str {
        "blogs"
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
        let mut collected = Vec::new();
        for (blog_id, blog_handle) in list_blogs(client, policy).await? {
            let remaining = match max_items {
                Some(cap) if collected.len() >= cap => break,
                Some(cap) => Some(cap - collected.len()),
                None => None,
            };
            let blog_id = blog_id.as_str();
            let blog_handle = blog_handle.as_str();
            let articles = fetch_all(
                |cursor| async move {
                    let path = cursor
                        .unwrap_or_else(|| format!("/blogs/{blog_id}/articles.json?limit=250"));
                    let response = client.get(&path).await?;
                    let raw = response
                        .body
                        .get("articles")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();
                    let items = raw
                        .iter()
                        .map(|article| map_article(blog_id, blog_handle, article))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Page {
                        items,
                        next_cursor: response.next_link,
                    })
                },
                remaining,
                policy,
            )
            .await?;
            collected.extend(articles);
        }
        Ok(collected)
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let blog_id = blog_id_of(item)?;
        let payload = article_payload(item);
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                client
                    .put(&format!("/blogs/{blog_id}/articles/{id}.json"), &payload)
                    .await?;
            }
            None => {
                client
                    .post(&format!("/blogs/{blog_id}/articles.json"), &payload)
                    .await?;
            }
        }
        Ok(())
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let blog_id = blog_id_of(item)?;
        let id = super::require_id(item)?;
        client
            .delete(&format!("/blogs/{blog_id}/articles/{id}.json"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_key_nests_under_blog_handle() {
        let raw = json!({
            "id": 31,
            "handle": "launch-day",
            "title": "Launch day",
            "body_html": "<p>live</p>",
        });
        let item = map_article("12", "news", &raw).unwrap();
        assert_eq!(item.handle, "news/launch-day");
        assert_eq!(item.meta["blog_id"], "12");

        let payload = article_payload(&item);
        assert_eq!(payload["article"]["handle"], "launch-day");
        assert_eq!(payload["article"]["title"], "Launch day");
    }

    #[test]
    fn upsert_requires_blog_linkage() {
        let item = Item {
            id: None,
            handle: "news/post".into(),
            content: String::new(),
            meta: json!({}),
        };
        assert!(matches!(blog_id_of(&item), Err(SyncError::Validation(_))));
    }
}
