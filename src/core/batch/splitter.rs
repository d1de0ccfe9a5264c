//! Batch splitter
//!
//! Partitions an item list into ordered, contiguous, non-overlapping chunks.

use super::types::Chunk;
use crate::utils::error::{Result, ServiceError};

/// Number of chunks `n` items produce at size `chunk_size`
pub fn chunk_count(n: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    n.div_ceil(chunk_size)
}

/// Split `items` into chunks of at most `chunk_size` items, preserving order
pub fn split_into_chunks<T: Clone>(items: &[T], chunk_size: usize) -> Result<Vec<Chunk<T>>> {
    if chunk_size == 0 {
        return Err(ServiceError::validation("chunk size must be at least 1"));
    }

    let total = chunk_count(items.len(), chunk_size);
    let chunks = items
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, slice)| Chunk {
            sequence: index + 1,
            total,
            offset: index * chunk_size,
            items: slice.to_vec(),
        })
        .collect();

    Ok(chunks)
}
