//! Concurrent fetching of independent resources
//!
//! Used where a page needs many small lookups at once (resolving media IDs to
//! URLs, for example) and one bad item must not sink the rest.

use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;

/// Runs every fetch concurrently and collects the results in input order
///
/// A failed fetch becomes `None` at its own position and is logged; the
/// others are unaffected. The output always has one slot per input.
pub async fn fetch_all<I, F, T, E>(fetches: I) -> Vec<Option<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    join_all(fetches)
        .await
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(index, error = %err, "batch fetch item failed");
                None
            }
        })
        .collect()
}
