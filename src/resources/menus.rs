//! Navigation menus via the GraphQL Admin API. The item tree is the
//! primary JSON file; id and title live in the sidecar.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::StoreClient;
use crate::error::SyncError;
use crate::resilience::RetryPolicy;

use super::{check_user_errors, graphql_list, require_id, required_str, Item, Resource};

pub struct Menus;

const LIST_QUERY: &str = r#"
query Menus($first: Int!, $after: String) {
  menus(first: $first, after: $after) {
    edges {
      node {
        id
        handle
        title
        items {
          title
          type
          url
          items {
            title
            type
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
mutation MenuCreate($title: String!, $handle: String!, $items: [MenuItemCreateInput!]!) {
  menuCreate(title: $title, handle: $handle, items: $items) {
    menu { id }
    userErrors { field message }
  }
}
"#;

const UPDATE_MUTATION: &str = r#"
mutation MenuUpdate($id: ID!, $title: String!, $items: [MenuItemUpdateInput!]!) {
  menuUpdate(id: $id, title: $title, items: $items) {
    menu { id }
    userErrors { field message }
  }
}
"#;

const DELETE_MUTATION: &str = r#"
mutation MenuDelete($id: ID!) {
  menuDelete(id: $id) {
    deletedMenuId
    userErrors { field message }
  }
}
"#;

fn map_menu(node: &Value) -> Result<Item, SyncError> {
    let handle = required_str(node, "handle")?;
    let items = node.get("items").cloned().unwrap_or_else(|| json!([]));
    Ok(Item {
        id: node.get("id").and_then(Value::as_str).map(|s| s.to_string()),
        handle,
        content: serde_json::to_string_pretty(&items)?,
        meta: json!({
            "id": node.get("id").cloned().unwrap_or(Value::Null),
            "title": node.get("title").cloned().unwrap_or(Value::Null),
        }),
    })
}

#[async_trait]
impl Resource for Menus {
    fn name(&self) -> &'static str {
        "menus"
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
            "menus",
            json!({}),
            max_items,
            map_menu,
        )
        .await
    }

    async fn upsert(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let items: Value = serde_json::from_str(&item.content)?;
        let title = item
            .meta
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(&item.handle)
            .to_string();
        match super::id_from_meta(&item.meta) {
            Some(id) => {
                let data = client
                    .graphql(
                        UPDATE_MUTATION,
                        json!({ "id": id, "title": title, "items": items }),
                    )
                    .await?;
                check_user_errors(&data["menuUpdate"], "menuUpdate")
            }
            None => {
                let data = client
                    .graphql(
                        CREATE_MUTATION,
                        json!({ "title": title, "handle": item.handle, "items": items }),
                    )
                    .await?;
                check_user_errors(&data["menuCreate"], "menuCreate")
            }
        }
    }

    async fn delete_remote(&self, client: &StoreClient, item: &Item) -> Result<(), SyncError> {
        let id = require_id(item)?;
        let data = client.graphql(DELETE_MUTATION, json!({ "id": id })).await?;
        check_user_errors(&data["menuDelete"], "menuDelete")
    }
}
