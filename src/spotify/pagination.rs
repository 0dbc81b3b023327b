use std::future::Future;

use tracing::debug;

use crate::{
    error::{Error, Result},
    types::Paging,
};

/// One page of a collection being harvested.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Projects every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }
}

impl<T> From<Paging<T>> for Page<T> {
    fn from(paging: Paging<T>) -> Self {
        Page {
            has_more: paging.next.is_some(),
            total: paging.total,
            items: paging.items,
        }
    }
}

/// Harvests a paginated collection into a single ordered vector.
///
/// The first page is awaited as given. When it signals more pages,
/// `fetch_page(offset)` is called sequentially, starting at the number of
/// items the first page returned and advancing by `page_size`, until the
/// declared total is reached.
///
/// # Errors
///
/// Returns `Error::CollectionStall` if a page comes back empty while fewer
/// than `total` items have been collected. Errors from the page calls are
/// propagated as is.
pub async fn collect_pages<T, First, F, Fut>(
    first: First,
    page_size: usize,
    mut fetch_page: F,
) -> Result<Vec<T>>
where
    First: Future<Output = Result<Page<T>>>,
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let first = first.await?;
    let total = first.total;
    let mut items = first.items;

    if !first.has_more {
        return Ok(items);
    }

    let page_size = page_size.max(1);
    let mut offset = items.len();

    while items.len() < total {
        debug!(offset, total, "fetching next page");
        let page = fetch_page(offset).await?;
        if page.items.is_empty() {
            return Err(Error::CollectionStall {
                accumulated: items.len(),
                total,
            });
        }

        items.extend(page.items);
        offset += page_size;
    }

    Ok(items)
}
