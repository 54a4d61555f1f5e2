//! Metaobjects via the GraphQL Admin API, keyed `<type>/<handle>`. The
//! field map is the primary JSON file; the gid and type live in the
//! sidecar.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::pagination::{fetch_all, Page, PageInfo};
use crate::resilience::RetryPolicy;

use super::{check_user_errors, graphql_list, require_id, required_str, Item, Resource};

pub struct Metaobjects;

const DEFINITIONS_QUERY: &str = r#"
query MetaobjectDefinitions($first: Int!, $after: String) {
  metaobjectDefinitions(first: $first, after: $after) {
    edges {
      node {
        type
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}
"#;

const OBJECTS_QUERY: &str = r#"
query Metaobjects($type: String!, $first: Int!, $after: String) {
  metaobjects(type: $type, first: $first, after: $after) {
    edges {
      node {
        id
        handle
        type
        fields {
          key
          value
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

const UPSERT_MUTATION: &str = r#"
mutation MetaobjectUpsert($handle: MetaobjectHandleInput!, $metaobject: MetaobjectUpsertInput!) {
  metaobjectUpsert(handle: $handle, metaobject: $metaobject) {
    metaobject { id }
    userErrors { field message }
  }
}
"#;

const DELETE_MUTATION: &str = r#"
mutation MetaobjectDelete($id: ID!) {
  metaobjectDelete(id: $id) {
    deletedId
    userErrors { field message }
  }
}
"#;

async fn list_types(client: &StoreClient, policy: &RetryPolicy) -> Result<Vec<String>, SyncError> {
    fetch_all(
        |cursor| async move {
            let data = client
                .graphql(DEFINITIONS_QUERY, json!({ "first": 100, "after": cursor }))
                .await?;
            let connection = data
                .get("metaobjectDefinitions")
                .cloned()
                .unwrap_or(Value::Null);
            let items = connection
                .get("edges")
                .and_then(Value::as_array)
                .map(|edges| {
                    edges
                        .iter()
                        .filter_map(|edge| edge.pointer("/node/type"))
                        .filter_map(Value::as_str)
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
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
        },
        None,
        policy,
    )
    .await
}

fn map_metaobject(node: &Value) -> Result<Item, SyncError> {
    let object_type = required_str(node, "type")?;
    let handle = required_str(node, "handle")?;
    let mut fields = Map::new();
    if let Some(raw_fields) = node.get("fields").and_then(Value::as_array) {
        for field in raw_fields {
            let key = required_str(field, "key")?;
            fields.insert(key, field.get("value").cloned().unwrap_or(Value::Null));
        }
    }
    Ok(Item {
        id: node.get("id").and_then(Value::as_str).map(|s| s.to_string()),
        handle: format!("{object_type}/{handle}"),
        content: serde_json::to_string_pretty(&Value::Object(fields))?,
        meta: json!({
            "id": node.get("id").cloned().unwrap_or(Value::Null),
            "type": object_type,
        }),
    })
}

/// Splits a `<type>/<handle>` key back into its parts.
fn split_key(item: &Item) -> Result<(String, String), SyncError> {
    // the type stored in the sidecar wins when present, so renaming the
    // parent directory does not silently change the object type
    let from_meta = item.meta.get("type").and_then(Value::as_str);
    match (from_meta, item.handle.split_once('/')) {
        (Some(object_type), Some((_, handle))) => Ok((object_type.to_string(), handle.to_string())),
        (None, Some((object_type, handle))) => Ok((object_type.to_string(), handle.to_string())),
        (Some(object_type), None) => Ok((object_type.to_string(), item.handle.clone())),
        (None, None) => Err(SyncError::Validation(format!(
            "metaobject '{}' has no type; expected '<type>/<handle>'",
            item.handle
        ))),
    }
}

#[async_trait]
impl Resource for Metaobjects {
    fn name(&self) -> &'static str {
        "metaobjects"
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
        let mut collected = Vec::new();
        for object_type in list_types(client, policy).await? {
            let remaining = match max_items {
                Some(cap) if collected.len() >= cap => break,
                Some(cap) => Some(cap - collected.len()),
                None => None,
            };
            let objects = graphql_list(
                client,
                policy,
                OBJECTS_QUERY,
                "metaobjects",
                json!({ "type": object_type }),
                remaining,
                map_metaobject,
            )
            .await?;
            collected.extend(objects);
        }
        Ok(collected)
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let (object_type, handle) = split_key(item)?;
        let field_map: Map<String, Value> = serde_json::from_str(&item.content)?;
        let fields: Vec<Value> = field_map
            .into_iter()
            .map(|(key, value)| json!({ "key": key, "value": value }))
            .collect();
        let data = client
            .graphql(
                UPSERT_MUTATION,
                json!({
                    "handle": { "type": object_type, "handle": handle },
                    "metaobject": { "fields": fields },
                }),
            )
            .await?;
        check_user_errors(&data["metaobjectUpsert"], "metaobjectUpsert")
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        let data = client.graphql(DELETE_MUTATION, json!({ "id": id })).await?;
        check_user_errors(&data["metaobjectDelete"], "metaobjectDelete")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metaobject_key_is_type_slash_handle() {
        let node = json!({
            "id": "gid://store/Metaobject/5",
            "type": "faq",
            "handle": "shipping",
            "fields": [
                { "key": "question", "value": "How long?" },
                { "key": "answer", "value": "Two days." }
            ],
        });
        let item = map_metaobject(&node).unwrap();
        assert_eq!(item.handle, "faq/shipping");
        let fields: Value = serde_json::from_str(&item.content).unwrap();
        assert_eq!(fields["question"], "How long?");
    }

    #[test]
    fn split_key_prefers_sidecar_type() {
        let item = Item {
            id: None,
            handle: "renamed/shipping".into(),
            content: "{}".into(),
            meta: json!({ "type": "faq" }),
        };
        assert_eq!(
            split_key(&item).unwrap(),
            ("faq".to_string(), "shipping".to_string())
        );
    }
}
