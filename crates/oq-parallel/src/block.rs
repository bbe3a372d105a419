//! Weighted block splitting: pack a sequence of weighted items into blocks
//! no heavier than `max_weight`, without ever mixing two different key
//! values (e.g. TRT model ids) in the same block. Mirrors
//! `block_splitter(sources, maxweight, weight_fn, trt_model_id_fn)`.

use std::hash::Hash;

/// Splits `items` into blocks such that:
/// - every item in a block shares the same key (`key_fn`);
/// - a block's total weight never exceeds `max_weight`, unless a single
///   item's own weight already exceeds it, in which case that item gets
///   its own singleton block (an oversized item can never be skipped);
/// - item order within each key group is preserved.
pub fn split_weighted<T, K, W, F>(items: &[T], max_weight: f64, weight_fn: W, key_fn: F) -> Vec<Vec<&T>>
where
    K: Eq + Hash + Clone,
    W: Fn(&T) -> f64,
    F: Fn(&T) -> K,
{
    let mut blocks: Vec<Vec<&T>> = Vec::new();
    let mut current: Vec<&T> = Vec::new();
    let mut current_weight = 0.0;
    let mut current_key: Option<K> = None;

    for item in items {
        let key = key_fn(item);
        let weight = weight_fn(item);
        let key_changed = current_key.as_ref().map(|k| k != &key).unwrap_or(false);
        let would_overflow = !current.is_empty() && current_weight + weight > max_weight;

        if key_changed || would_overflow {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            current_weight = 0.0;
        }

        current.push(item);
        current_weight += weight;
        current_key = Some(key);
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}
