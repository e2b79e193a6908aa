// src/api/aggregator.rs
//! Final shaping of fetched items.

use super::types::Item;

/// Sorts items by id and drops repeats of the same id.
///
/// The sort is stable, so for a repeated id the first item received wins.
pub fn aggregate(mut items: Vec<Item>) -> Vec<Item> {
    let received = items.len();
    items.sort_by_key(|item| item.id);
    items.dedup_by_key(|item| item.id);

    if items.len() < received {
        log::debug!("Dropped {} duplicate items", received - items.len());
    }
    items
}
