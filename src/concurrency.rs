//! Bounded-concurrency mapping over a slice.

use std::{
    future::Future,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::future::try_join_all;

/// Maps `transform` over `items` with at most `limit` transforms in flight.
///
/// `max(1, limit)` workers share a cursor: each claims the next unprocessed
/// index, awaits the transform, stores the value in that index's slot and
/// claims again. The output has the same length and order as `items` no matter
/// in which order the transforms finish. A slow item only occupies its own
/// worker; the others keep draining the queue.
///
/// The first `Err` returned by a transform ends the whole map and is returned
/// as is. Callers that want per-item isolation return `Ok` with a failure
/// marker instead.
///
/// # Example
///
/// ```
/// let lengths = map_with_concurrency(&names, 3, |name| async move {
///     Ok::<_, Error>(name.len())
/// })
/// .await?;
/// ```
pub async fn map_with_concurrency<'a, T, R, E, F, Fut>(
    items: &'a [T],
    limit: usize,
    transform: F,
) -> Result<Vec<R>, E>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let workers = limit.max(1).min(items.len());
    let cursor = &AtomicUsize::new(0);
    let slots: &Mutex<Vec<Option<R>>> = &Mutex::new((0..items.len()).map(|_| None).collect());
    let transform = &transform;

    try_join_all((0..workers).map(move |_| async move {
        loop {
            let index = cursor.fetch_add(1, Ordering::Relaxed);
            let Some(item) = items.get(index) else {
                break;
            };

            let value = transform(item).await?;
            slots.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(value);
        }
        Ok::<(), E>(())
    }))
    .await?;

    let slots = std::mem::take(&mut *slots.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(slots.into_iter().flatten().collect())
}
