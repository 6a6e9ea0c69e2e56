//! Fixed-capacity per-tile segments.
//!
//! A [`TiledVec`] is one contiguous `Vec<T>` carved into `tiles` equal
//! segments of `capacity` slots, plus a live length per segment. A
//! [`TileSegment`] is the mutable view of one tile's segment handed to the
//! worker that owns that tile.

use rayon::prelude::*;
use tilepic_core::{OverflowError, Phase, Resource};

/// Per-tile fixed-capacity storage backed by a single allocation.
///
/// The backing storage never grows. Every write path checks the tile's
/// capacity first and returns an [`OverflowError`] naming `resource`
/// instead of writing past it.
#[derive(Clone, Debug)]
pub struct TiledVec<T> {
    resource: Resource,
    capacity: usize,
    /// Physical distance between segments; at least 1 so the backing
    /// storage always chunks into exactly `tiles` pieces.
    stride: usize,
    data: Vec<T>,
    lens: Vec<usize>,
}

impl<T: Copy + Default + Send + Sync> TiledVec<T> {
    /// Allocate `tiles` empty segments of `capacity` slots each.
    pub fn new(resource: Resource, tiles: usize, capacity: usize) -> Self {
        let stride = capacity.max(1);
        Self {
            resource,
            capacity,
            stride,
            data: vec![T::default(); tiles * stride],
            lens: vec![0; tiles],
        }
    }

    /// The resource this storage represents in overflow reports.
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Number of tile segments.
    pub fn tiles(&self) -> usize {
        self.lens.len()
    }

    /// Slots per tile.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live length of `tile`'s segment.
    pub fn len(&self, tile: usize) -> usize {
        self.lens[tile]
    }

    /// Live length of every segment, in tile order.
    pub fn lens(&self) -> &[usize] {
        &self.lens
    }

    /// Sum of live lengths over all tiles.
    pub fn total_len(&self) -> usize {
        self.lens.iter().sum()
    }

    /// Whether every segment is empty.
    pub fn is_empty(&self) -> bool {
        self.lens.iter().all(|&n| n == 0)
    }

    /// The live elements of `tile`.
    pub fn get(&self, tile: usize) -> &[T] {
        let start = tile * self.stride;
        &self.data[start..start + self.lens[tile]]
    }

    /// Mutable access to the live elements of `tile`.
    pub fn get_mut(&mut self, tile: usize) -> &mut [T] {
        let start = tile * self.stride;
        &mut self.data[start..start + self.lens[tile]]
    }

    /// Append `value` to `tile`'s segment.
    pub fn push(&mut self, tile: usize, value: T, phase: Phase) -> Result<(), OverflowError> {
        self.segment_mut(tile).push(value, phase)
    }

    /// Reset every live length to zero without touching the storage.
    pub fn clear(&mut self) {
        self.lens.fill(0);
    }

    /// Mutable view of one tile's segment.
    pub fn segment_mut(&mut self, tile: usize) -> TileSegment<'_, T> {
        let start = tile * self.stride;
        TileSegment {
            tile,
            resource: self.resource,
            slots: &mut self.data[start..start + self.capacity],
            len: &mut self.lens[tile],
        }
    }

    /// Live elements of every tile, in tile order.
    pub fn iter_tiles(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.data
            .chunks(self.stride)
            .zip(&self.lens)
            .map(|(slots, &n)| &slots[..n])
    }

    /// Parallel iterator over the live elements of every tile.
    pub fn par_tiles(&self) -> impl IndexedParallelIterator<Item = &[T]> + '_ {
        self.data
            .par_chunks(self.stride)
            .zip(self.lens.par_iter())
            .map(|(slots, &n)| &slots[..n])
    }

    /// Parallel iterator handing each tile's segment to one worker.
    pub fn par_segments_mut(
        &mut self,
    ) -> impl IndexedParallelIterator<Item = TileSegment<'_, T>> + '_ {
        let capacity = self.capacity;
        let resource = self.resource;
        self.data
            .par_chunks_mut(self.stride)
            .zip(self.lens.par_iter_mut())
            .enumerate()
            .map(move |(tile, (slots, len))| TileSegment {
                tile,
                resource,
                slots: &mut slots[..capacity],
                len,
            })
    }
}

/// Exclusive view of one tile's fixed-capacity segment.
#[derive(Debug)]
pub struct TileSegment<'a, T> {
    tile: usize,
    resource: Resource,
    slots: &'a mut [T],
    len: &'a mut usize,
}

impl<T: Copy> TileSegment<'_, T> {
    /// Index of the tile this segment belongs to.
    pub fn tile(&self) -> usize {
        self.tile
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        *self.len
    }

    /// Whether the segment holds no live elements.
    pub fn is_empty(&self) -> bool {
        *self.len == 0
    }

    /// Slot capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The live elements.
    pub fn live(&self) -> &[T] {
        &self.slots[..*self.len]
    }

    /// Mutable access to the live elements.
    pub fn live_mut(&mut self) -> &mut [T] {
        &mut self.slots[..*self.len]
    }

    /// The error this segment reports for a request of `requested` slots.
    pub fn overflow(&self, phase: Phase, requested: usize) -> OverflowError {
        OverflowError {
            phase,
            resource: self.resource,
            tile: Some(self.tile),
            capacity: self.capacity(),
            requested,
        }
    }

    /// Append one element, or report overflow without writing.
    pub fn push(&mut self, value: T, phase: Phase) -> Result<(), OverflowError> {
        let n = *self.len;
        if n >= self.capacity() {
            return Err(self.overflow(phase, n + 1));
        }
        self.slots[n] = value;
        *self.len = n + 1;
        Ok(())
    }

    /// Append all of `values`, or none of them.
    pub fn extend_from_slice(&mut self, values: &[T], phase: Phase) -> Result<(), OverflowError> {
        let n = *self.len;
        let end = n + values.len();
        if end > self.capacity() {
            return Err(self.overflow(phase, end));
        }
        self.slots[n..end].copy_from_slice(values);
        *self.len = end;
        Ok(())
    }

    /// Shorten the live length to `len`. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < *self.len {
            *self.len = len;
        }
    }

    /// Overwrite the segment with `len` elements produced by `fill`, which
    /// receives the full slot array.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the capacity.
    pub fn fill_with(&mut self, len: usize, fill: impl FnOnce(&mut [T])) {
        assert!(len <= self.capacity(), "segment length {len} beyond capacity");
        fill(&mut *self.slots);
        *self.len = len;
    }

    /// Reset the live length to zero.
    pub fn clear(&mut self) {
        *self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiled(tiles: usize, capacity: usize) -> TiledVec<u32> {
        TiledVec::new(Resource::TileStore, tiles, capacity)
    }

    #[test]
    fn new_is_empty() {
        let v = tiled(3, 4);
        assert_eq!(v.tiles(), 3);
        assert_eq!(v.capacity(), 4);
        assert!(v.is_empty());
        assert_eq!(v.total_len(), 0);
        assert!(v.get(2).is_empty());
    }

    #[test]
    fn push_respects_capacity() {
        let mut v = tiled(2, 2);
        v.push(1, 10, Phase::Distribution).unwrap();
        v.push(1, 11, Phase::Distribution).unwrap();
        let err = v.push(1, 12, Phase::Distribution).unwrap_err();
        assert_eq!(err.tile, Some(1));
        assert_eq!(err.capacity, 2);
        assert_eq!(err.requested, 3);
        assert_eq!(err.resource, Resource::TileStore);
        assert_eq!(v.get(1), &[10, 11]);
        assert!(v.get(0).is_empty());
    }

    #[test]
    fn zero_capacity_still_has_one_segment_per_tile() {
        let mut v = tiled(3, 0);
        assert_eq!(v.par_segments_mut().count(), 3);
        assert_eq!(v.iter_tiles().count(), 3);
        let err = v.push(0, 1, Phase::Push).unwrap_err();
        assert_eq!(err.capacity, 0);
        assert_eq!(err.requested, 1);
    }

    #[test]
    fn extend_is_all_or_nothing() {
        let mut v = tiled(1, 3);
        let mut seg = v.segment_mut(0);
        seg.extend_from_slice(&[1, 2], Phase::SortCopyIn).unwrap();
        let err = seg.extend_from_slice(&[3, 4], Phase::SortCopyIn).unwrap_err();
        assert_eq!(err.requested, 4);
        assert_eq!(seg.live(), &[1, 2]);
    }

    #[test]
    fn par_segments_are_disjoint() {
        let mut v = tiled(4, 3);
        v.par_segments_mut().for_each(|mut seg| {
            for k in 0..=seg.tile() {
                if k < seg.capacity() {
                    seg.push((seg.tile() * 10 + k) as u32, Phase::Push).unwrap();
                }
            }
        });
        assert_eq!(v.lens(), &[1, 2, 3, 3]);
        assert_eq!(v.get(2), &[20, 21, 22]);
        let live: Vec<usize> = v.par_tiles().map(<[u32]>::len).collect();
        assert_eq!(live, vec![1, 2, 3, 3]);
    }

    #[test]
    fn fill_with_sets_length() {
        let mut v = tiled(2, 4);
        v.segment_mut(1).fill_with(2, |slots| {
            slots[0] = 7;
            slots[1] = 8;
        });
        assert_eq!(v.get(1), &[7, 8]);
        v.segment_mut(1).truncate(1);
        assert_eq!(v.get(1), &[7]);
        v.clear();
        assert!(v.is_empty());
    }
}
