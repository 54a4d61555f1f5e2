//! Store files via the GraphQL Admin API. Each file is represented
//! locally by a JSON descriptor (source URL plus alt text); pushing a
//! descriptor re-creates the file from its URL. Binary payloads are not
//! mirrored.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{check_user_errors, graphql_list, require_id, sanitize_handle, Item, Resource};

pub struct Files;

const LIST_QUERY: &str = r#"
query Files($first: Int!, $after: String) {
  files(first: $first, after: $after) {
    edges {
      node {
        id
        alt
        ... on GenericFile {
          url
        }
        ... on MediaImage {
          image {
            url
          }
        }
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}
"#;

const CREATE_MUTATION: &str = r#"
mutation FileCreate($files: [FileCreateInput!]!) {
  fileCreate(files: $files) {
    files { id }
    userErrors { field message }
  }
}
"#;

const DELETE_MUTATION: &str = r#"
mutation FileDelete($fileIds: [ID!]!) {
  fileDelete(fileIds: $fileIds) {
    deletedFileIds
    userErrors { field message }
  }
}
"#;

fn file_url(node: &Value) -> Option<String> {
    node.get("url")
        .and_then(Value::as_str)
        .or_else(|| node.pointer("/image/url").and_then(Value::as_str))
        .map(|s| s.to_string())
}

/// Derives the stable key from the URL's filename, ignoring the query
/// string the CDN appends.
fn handle_from_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    let name = without_query.rsplit('/').next().unwrap_or(without_query);
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    sanitize_handle(stem)
}

fn map_file(node: &Value) -> Result<Item, SyncError> {
    let url = file_url(node)
        .ok_or_else(|| SyncError::Json("file node carries no URL".into()))?;
    let alt = node.get("alt").cloned().unwrap_or(Value::Null);
    let content = serde_json::to_string_pretty(&json!({
        "url": url,
        "alt": alt,
    }))?;
    Ok(Item {
        id: node.get("id").and_then(Value::as_str).map(|s| s.to_string()),
        handle: handle_from_url(&url),
        content,
        meta: json!({
            "id": node.get("id").cloned().unwrap_or(Value::Null),
        }),
    })
}

#[async_trait]
impl Resource for Files {
    fn name(&self) -> &'static str {
        "files"
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
        graphql_list(
            client,
            policy,
            LIST_QUERY,
            "files",
            json!({}),
            max_items,
            map_file,
        )
        .await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let doc: Value = serde_json::from_str(&item.content)?;
        let url = doc
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SyncError::Validation(format!(
                    "file '{}' descriptor is missing the required field 'url'",
                    item.handle
                ))
            })?;
        let data = client
            .graphql(
                CREATE_MUTATION,
                json!({
                    "files": [{
                        "originalSource": url,
                        "alt": doc.get("alt").cloned().unwrap_or(Value::Null),
                    }]
                }),
            )
            .await?;
        check_user_errors(&data["fileCreate"], "fileCreate")
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        let data = client
            .graphql(DELETE_MUTATION, json!({ "fileIds": [id] }))
            .await?;
        check_user_errors(&data["fileDelete"], "fileDelete")
    }
}
