//! Walking paged listings to completion.

use std::future::Future;

/// One page of a listing.
///
/// Carries the slice of items at some offset plus the total across all
/// pages as the server reported it at fetch time. Pages are transient;
/// nothing here is cached, and the reported total may change between
/// fetches while the listing is being modified concurrently.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items of this page, in server order.
    pub items: Vec<T>,

    /// Total item count across all pages, as reported with this page.
    pub total: u64,
}

/// Collect every item of a paged listing.
///
/// `fetch` is called with the number of items already retrieved. That is
/// an item offset, never a page index; the two disagree whenever the
/// page size is greater than one, and the control plane expects items to
/// skip.
///
/// The walk stops once the accumulated count reaches the total reported
/// by the most recent page. The comparison is `>=` rather than equality:
/// deletions concurrent with the walk can shrink the total below the
/// running count, and an equality check would never fire. A page that
/// contributes no items while the total still claims more also ends the
/// walk, so a stalled listing cannot spin forever.
///
/// The first fetch error aborts the walk and is returned as-is.
pub async fn collect<T, E, F, Fut>(mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();

    loop {
        let page = fetch(items.len() as u64).await?;
        let fetched = page.items.len();
        let total = page.total;
        items.extend(page.items);

        if items.len() as u64 >= total {
            break;
        }

        if fetched == 0 {
            tracing::warn!(
                collected = items.len(),
                total,
                "listing stalled before reported total"
            );
            break;
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    /// Serves `data` in pages of `size`, recording each requested offset.
    fn pages<'d>(
        data: &'d [u32],
        size: usize,
        offsets: &'d RefCell<Vec<u64>>,
    ) -> impl FnMut(u64) -> std::future::Ready<Result<Page<u32>, &'static str>> + 'd {
        move |offset| {
            offsets.borrow_mut().push(offset);
            let items = data
                .iter()
                .skip(offset as usize)
                .take(size)
                .copied()
                .collect();
            std::future::ready(Ok(Page {
                items,
                total: data.len() as u64,
            }))
        }
    }

    #[tokio::test]
    async fn collects_exactly_the_listing() {
        let page_size = 3;
        for n in [0usize, 1, 3, 4, 30] {
            let data: Vec<u32> = (0..n as u32).collect();
            let offsets = RefCell::new(Vec::new());

            let collected = collect(pages(&data, page_size, &offsets)).await.unwrap();

            assert_eq!(collected, data, "n = {n}");

            let fetches = offsets.borrow().len();
            assert!(fetches <= n.div_ceil(page_size).max(1), "n = {n}");

            let expected: Vec<u64> = (0..fetches).map(|i| (i * page_size) as u64).collect();
            assert_eq!(*offsets.borrow(), expected, "offsets are item counts");
        }
    }

    #[tokio::test]
    async fn empty_listing_terminates_after_one_fetch() {
        let offsets = RefCell::new(Vec::new());
        let collected = collect(pages(&[], 5, &offsets)).await.unwrap();

        assert!(collected.is_empty());
        assert_eq!(*offsets.borrow(), vec![0]);
    }

    #[tokio::test]
    async fn shrinking_total_still_terminates() {
        // Page one claims six items; by page two, two of them are gone.
        let fetches = RefCell::new(0u32);
        let collected = collect(|offset| {
            *fetches.borrow_mut() += 1;
            let page = match offset {
                0 => Page {
                    items: vec!["a", "b"],
                    total: 6,
                },
                2 => Page {
                    items: vec!["c", "d"],
                    total: 4,
                },
                other => panic!("unexpected offset {other}"),
            };
            std::future::ready(Ok::<_, &'static str>(page))
        })
        .await
        .unwrap();

        assert_eq!(collected, vec!["a", "b", "c", "d"]);
        assert_eq!(*fetches.borrow(), 2);
    }

    #[tokio::test]
    async fn overshooting_total_still_terminates() {
        // The running count can pass a shrunken total entirely.
        let collected = collect(|offset| {
            let page = match offset {
                0 => Page {
                    items: vec![1, 2, 3],
                    total: 5,
                },
                3 => Page {
                    items: vec![4, 5],
                    total: 2,
                },
                other => panic!("unexpected offset {other}"),
            };
            std::future::ready(Ok::<_, &'static str>(page))
        })
        .await
        .unwrap();

        assert_eq!(collected, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn stalled_listing_does_not_spin() {
        let fetches = RefCell::new(0u32);
        let collected = collect(|offset| {
            *fetches.borrow_mut() += 1;
            let page = match offset {
                0 => Page {
                    items: vec![1, 2],
                    total: 5,
                },
                // Server keeps promising more but returns nothing.
                _ => Page {
                    items: Vec::new(),
                    total: 5,
                },
            };
            std::future::ready(Ok::<_, &'static str>(page))
        })
        .await
        .unwrap();

        assert_eq!(collected, vec![1, 2]);
        assert_eq!(*fetches.borrow(), 2);
    }

    #[tokio::test]
    async fn first_error_aborts_the_walk() {
        let fetches = RefCell::new(0u32);
        let result = collect(|offset| {
            *fetches.borrow_mut() += 1;
            let page = match offset {
                0 => Ok(Page {
                    items: vec![1, 2],
                    total: 4,
                }),
                _ => Err("listing failed"),
            };
            std::future::ready(page)
        })
        .await;

        assert_eq!(result.unwrap_err(), "listing failed");
        assert_eq!(*fetches.borrow(), 2, "no retry after a failure");
    }
}
