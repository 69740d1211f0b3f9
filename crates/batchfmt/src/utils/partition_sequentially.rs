use super::get_bytes_hash;

/// Splits the items into batches of roughly `size_target` items and at most `size_max` items.
///
/// The items are sorted by key, and a batch is closed after an item once the batch has
/// reached `size_target` and the low bits of the item key's hash are zero. Because a
/// boundary only depends on the keys around it, adding or removing one item only
/// changes the batch that item falls in, which keeps batches stable between runs.
pub fn partition_sequentially<T>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> String, size_target: usize, size_max: usize) -> Vec<Vec<T>> {
  let size_target = size_target.max(1);
  let size_max = size_max.max(size_target);
  let mask = boundary_mask(size_target);

  let mut keyed_items = items.into_iter().map(|item| (key(&item), item)).collect::<Vec<_>>();
  keyed_items.sort_by(|a, b| a.0.cmp(&b.0));

  let mut batches = Vec::new();
  let mut batch = Vec::new();
  for (item_key, item) in keyed_items {
    batch.push(item);
    let is_boundary = batch.len() >= size_target && get_bytes_hash(item_key.as_bytes()) & mask == 0;
    if is_boundary || batch.len() >= size_max {
      batches.push(std::mem::take(&mut batch));
    }
  }
  if !batch.is_empty() {
    batches.push(batch);
  }
  batches
}

/// For small targets every item past the target is a boundary.
fn boundary_mask(size_target: usize) -> u64 {
  let bits = size_target.ilog2().saturating_sub(1);
  (1u64 << bits) - 1
}
