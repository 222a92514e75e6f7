//! Paginated Collector
//!
//! Drains every page of a listing operation into one ordered sequence.

use crate::error::InventoryResult;
use std::collections::HashSet;
use std::future::Future;

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token, present while more pages remain
    pub next_page: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page: Option<String>) -> Self {
        Self { items, next_page }
    }

    /// A final page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

/// Fetch all items (auto-paginate)
///
/// `list_page` is invoked with `None` first, then with each continuation
/// token until a page arrives without one. Items keep page order, then
/// in-page order. A failing page aborts the whole listing. A continuation
/// token seen before ends the listing.
pub async fn collect_all<T, F, Fut>(mut list_page: F) -> InventoryResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = InventoryResult<Page<T>>>,
{
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut seen_tokens = HashSet::new();

    loop {
        let page = list_page(page_token.take()).await?;
        all_items.extend(page.items);

        match page.next_page {
            None => break,
            Some(next) if !seen_tokens.insert(next.clone()) => {
                tracing::warn!("Listing returned page token {:?} twice, stopping", next);
                break;
            }
            Some(next) => page_token = Some(next),
        }
    }

    Ok(all_items)
}
