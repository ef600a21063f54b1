//! Page planning and concurrent fetch-and-merge for list endpoints.

use std::future::Future;

use futures_util::future::join_all;
use tracing::debug;

use crate::errors::{BadResponseReason, Result};
use crate::models::PageQuery;

/// Upper bound on the pages a single fetch will plan.
pub const MAX_PAGES: u64 = 10_000;

/// Pages needed to read `total` items at `per_page` items per call.
///
/// If everything fits in one page a single call asks for exactly `total`
/// items with no offset. Otherwise pages step through offsets
/// `0, per_page, 2 * per_page, ...` while the offset is below `total`.
///
/// `total` comes from the server, so a plan of more than [`MAX_PAGES`]
/// pages is rejected as a bad response.
pub fn plan_pages(total: u64, per_page: u64) -> Result<Vec<PageQuery>> {
    let per_page = per_page.max(1);
    if total <= per_page {
        return Ok(vec![PageQuery::single(total)]);
    }
    if total.div_ceil(per_page) > MAX_PAGES {
        return Err(BadResponseReason::ImplausibleTotal {
            total,
            per_page,
            max_pages: MAX_PAGES,
        }
        .into());
    }

    let mut pages = Vec::new();
    let mut offset = Some(0);
    while let Some(current) = offset.filter(|o| *o < total) {
        pages.push(PageQuery::at(per_page, current));
        offset = current.checked_add(per_page);
    }
    Ok(pages)
}

/// Issue every page at once and concatenate the items in page order.
///
/// All calls are awaited before the results are inspected; the first failed
/// page (in page order) fails the whole fetch.
pub async fn fetch_pages<T, F, Fut>(pages: Vec<PageQuery>, fetch: F) -> Result<Vec<T>>
where
    F: Fn(PageQuery) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    debug!("Fetching {} page(s)", pages.len());
    let results = join_all(pages.into_iter().map(fetch)).await;

    let mut merged = Vec::new();
    for page in results {
        merged.extend(page?);
    }
    Ok(merged)
}
