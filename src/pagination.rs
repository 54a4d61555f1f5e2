//! Cursor-driven pagination over the resilient executor.
//!
//! Both pagination styles used by the platform reduce to the same loop: a
//! REST listing carries a `rel="next"` URL in its `Link` header, and a
//! GraphQL connection carries `pageInfo { hasNextPage endCursor }`. Page
//! fetchers adapt either style to [`Page`] and the loop stays agnostic.

use std::sync::OnceLock;

use futures::Future;

use regex::Regex;
use serde::Deserialize;

use crate::error::SyncError;
use crate::resilience::{execute, RetryPolicy};

/// One page of a listing plus the token for the next one.
///
/// `next_cursor: None` signals the final page.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// GraphQL connection paging info, adapted to the cursor contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

impl PageInfo {
    pub fn next_cursor(&self) -> Option<String> {
        if self.has_next_page {
            self.end_cursor.clone()
        } else {
            None
        }
    }
}

/// Walks a paginated listing to completion and returns all items in order.
///
/// Each page request runs through the resilient executor, so a transient
/// failure mid-listing retries that page only. A page that still fails
/// aborts the whole listing; a partial result is never returned as if it
/// were complete. `max_items` truncates the result and stops fetching as
/// soon as enough items have been collected.
pub async fn fetch_all<T, F, Fut>(
    mut fetcher: F,
    max_items: Option<usize>,
    policy: &RetryPolicy,
) -> Result<Vec<T>, SyncError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, SyncError>>,
{
    let mut collected: Vec<T> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = execute(|| fetcher(cursor.clone()), policy).await?;
        collected.extend(page.items);
        if let Some(cap) = max_items {
            if collected.len() >= cap {
                collected.truncate(cap);
                return Ok(collected);
            }
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(collected),
        }
    }
}

/// Extracts the `rel="next"` URL from a `Link` response header.
pub fn next_link(link_header: &str) -> Option<String> {
    static NEXT_LINK: OnceLock<Regex> = OnceLock::new();
    let pattern = NEXT_LINK
        .get_or_init(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("valid regex"));
    pattern
        .captures(link_header)
        .map(|caps| caps[1].to_string())
}
