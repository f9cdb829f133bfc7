//! Per-tile integer layers.
//!
//! Every physical layer of a chunk is a fixed `W × H` grid of signed
//! integers. Three storage strategies share the [`IntegerMatrix`] contract:
//!
//! - [`CompactMatrix`]: exact values, backing cells widen 1 → 2 → 4 bytes on demand
//! - [`DownsampledMatrix`]: one sum per 2×2 block, lossy reconstruction
//! - [`ObjectMatrix`]: categorical values deduplicated into a small catalog

mod compact;
mod downsampled;
mod object;

pub use compact::{CellWidth, CompactMatrix};
pub use downsampled::DownsampledMatrix;
pub use object::ObjectMatrix;

/// A fixed-shape grid of signed integers.
///
/// Indices outside `[0, size_x) × [0, size_y)` are a programming error and
/// panic.
pub trait IntegerMatrix {
    fn size_x(&self) -> usize;

    fn size_y(&self) -> usize;

    fn get(&self, x: usize, y: usize) -> i32;

    fn set(&mut self, x: usize, y: usize, value: i32);

    /// Add `delta` to the cell. Panics if the result overflows `i32`.
    fn add(&mut self, x: usize, y: usize, delta: i32) {
        let current = self.get(x, y);
        let value = current.checked_add(delta).unwrap_or_else(|| {
            panic!("matrix cell ({}, {}) overflowed: {} + {}", x, y, current, delta)
        });
        self.set(x, y, value);
    }
}

/// Row-major offset of `(x, y)`, panicking when outside the declared shape.
pub(crate) fn cell_offset(size_x: usize, size_y: usize, x: usize, y: usize) -> usize {
    if x >= size_x || y >= size_y {
        panic!(
            "matrix index ({}, {}) out of bounds for shape {}x{}",
            x, y, size_x, size_y
        );
    }
    y * size_x + x
}
