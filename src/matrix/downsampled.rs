use serde::{Deserialize, Serialize};

use super::{CompactMatrix, IntegerMatrix};

/// Half-resolution integer grid.
///
/// Each backing cell holds the sum of the 2×2 logical block it covers. A
/// logical read blends the tile's own block with the block next to it on
/// each axis (the one on the tile's side of the block):
///
/// `value = (2 * central + side_x + side_y) / 16`
///
/// On an odd side the last block row or column only covers one tile; its
/// sum is scaled up to four tiles before blending. Missing neighbours at the
/// grid edge are extrapolated as `2 * central - opposite`; on an axis with a
/// single block the central sum stands in for the side.
///
/// This layer is lossy. `set` is `add(value - get)`, which moves the whole
/// block sum and therefore shifts the reconstructed values of the block-mates
/// as well. Constant fields reconstruct exactly at any size, linear fields
/// when both sides are even; anything sharper only keeps its broad trend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownsampledMatrix {
    size_x: usize,
    size_y: usize,
    blocks: CompactMatrix,
}

impl DownsampledMatrix {
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Self {
            size_x,
            size_y,
            blocks: CompactMatrix::new(size_x.div_ceil(2), size_y.div_ceil(2)),
        }
    }

    /// Stored sum of block `(bx, by)`.
    pub fn block_sum(&self, bx: usize, by: usize) -> i32 {
        self.blocks.get(bx, by)
    }

    pub fn blocks_x(&self) -> usize {
        self.blocks.size_x()
    }

    pub fn blocks_y(&self) -> usize {
        self.blocks.size_y()
    }

    fn check(&self, x: usize, y: usize) {
        if x >= self.size_x || y >= self.size_y {
            panic!(
                "matrix index ({}, {}) out of bounds for shape {}x{}",
                x, y, self.size_x, self.size_y
            );
        }
    }

    /// Tiles covered by block `(bx, by)`: 4, or fewer on an odd edge.
    fn block_tiles(&self, bx: usize, by: usize) -> i64 {
        let wide = (self.size_x - 2 * bx).min(2);
        let tall = (self.size_y - 2 * by).min(2);
        (wide * tall) as i64
    }

    /// Block sum scaled to a full 2×2 block.
    fn full_sum(&self, bx: usize, by: usize) -> i64 {
        self.blocks.get(bx, by) as i64 * 4 / self.block_tiles(bx, by)
    }

    /// Sum of the block beside `(bx, by)`, stepping `-1` when `low` and `+1`
    /// otherwise, along the axis selected by `along_x`.
    fn side_sum(&self, bx: usize, by: usize, low: bool, along_x: bool) -> i64 {
        let (index, count) = if along_x {
            (bx, self.blocks.size_x())
        } else {
            (by, self.blocks.size_y())
        };
        let central = self.full_sum(bx, by);
        if count == 1 {
            return central;
        }
        let at = |i: usize| -> i64 {
            if along_x {
                self.full_sum(i, by)
            } else {
                self.full_sum(bx, i)
            }
        };
        match (low, index) {
            (true, 0) => 2 * central - at(1),
            (true, i) => at(i - 1),
            (false, i) if i + 1 == count => 2 * central - at(i - 1),
            (false, i) => at(i + 1),
        }
    }
}

impl IntegerMatrix for DownsampledMatrix {
    fn size_x(&self) -> usize {
        self.size_x
    }

    fn size_y(&self) -> usize {
        self.size_y
    }

    fn get(&self, x: usize, y: usize) -> i32 {
        self.check(x, y);
        let (bx, by) = (x / 2, y / 2);
        let central = self.full_sum(bx, by);
        let side_x = self.side_sum(bx, by, x % 2 == 0, true);
        let side_y = self.side_sum(bx, by, y % 2 == 0, false);
        ((2 * central + side_x + side_y) / 16) as i32
    }

    fn set(&mut self, x: usize, y: usize, value: i32) {
        let current = self.get(x, y);
        let delta = value.checked_sub(current).unwrap_or_else(|| {
            panic!("matrix cell ({}, {}) overflowed: {} - {}", x, y, value, current)
        });
        self.add(x, y, delta);
    }

    fn add(&mut self, x: usize, y: usize, delta: i32) {
        self.check(x, y);
        self.blocks.add(x / 2, y / 2, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(matrix: &mut DownsampledMatrix, f: impl Fn(usize, usize) -> i32) {
        for y in 0..matrix.size_y() {
            for x in 0..matrix.size_x() {
                matrix.add(x, y, f(x, y));
            }
        }
    }

    #[test]
    fn test_backing_is_half_resolution() {
        let matrix = DownsampledMatrix::new(7, 4);
        assert_eq!(matrix.blocks_x(), 4);
        assert_eq!(matrix.blocks_y(), 2);
        assert_eq!(matrix.size_x(), 7);
    }

    #[test]
    fn test_constant_field_is_exact() {
        let mut matrix = DownsampledMatrix::new(8, 8);
        fill(&mut matrix, |_, _| 37);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(matrix.get(x, y), 37);
            }
        }
    }

    #[test]
    fn test_linear_field_is_exact() {
        let mut matrix = DownsampledMatrix::new(8, 6);
        let f = |x: usize, y: usize| 2 * x as i32 - 3 * y as i32 + 5;
        fill(&mut matrix, f);
        for y in 0..6 {
            for x in 0..8 {
                assert_eq!(matrix.get(x, y), f(x, y), "at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_block_sum_consistent_with_reconstruction() {
        let mut matrix = DownsampledMatrix::new(8, 8);
        fill(&mut matrix, |x, y| 3 * x as i32 + 7 * y as i32 - 20);
        for by in 0..matrix.blocks_y() {
            for bx in 0..matrix.blocks_x() {
                let reconstructed: i32 = (0..2)
                    .flat_map(|dy| (0..2).map(move |dx| (bx * 2 + dx, by * 2 + dy)))
                    .map(|(x, y)| matrix.get(x, y))
                    .sum();
                let stored = matrix.block_sum(bx, by);
                assert!(
                    (reconstructed - stored).abs() <= 3,
                    "block ({}, {}): {} vs {}",
                    bx,
                    by,
                    reconstructed,
                    stored
                );
            }
        }
    }

    #[test]
    fn test_constant_field_is_exact_on_odd_sides() {
        for (w, h) in [(7, 7), (5, 3), (31, 31), (1, 5)] {
            let mut matrix = DownsampledMatrix::new(w, h);
            fill(&mut matrix, |_, _| 20);
            for y in 0..h {
                for x in 0..w {
                    assert_eq!(matrix.get(x, y), 20, "{}x{} at ({}, {})", w, h, x, y);
                }
            }
        }
    }

    #[test]
    fn test_edge_block_sums_match_reconstruction() {
        let mut matrix = DownsampledMatrix::new(7, 5);
        fill(&mut matrix, |_, _| -9);
        for by in 0..matrix.blocks_y() {
            for bx in 0..matrix.blocks_x() {
                let reconstructed: i32 = (by * 2..(by * 2 + 2).min(5))
                    .flat_map(|y| (bx * 2..(bx * 2 + 2).min(7)).map(move |x| (x, y)))
                    .map(|(x, y)| matrix.get(x, y))
                    .sum();
                assert_eq!(reconstructed, matrix.block_sum(bx, by), "block ({}, {})", bx, by);
            }
        }
        assert_eq!(matrix.block_sum(3, 2), -9);
        assert_eq!(matrix.block_sum(3, 0), -18);
    }

    #[test]
    fn test_set_on_partial_block() {
        let mut matrix = DownsampledMatrix::new(7, 7);
        fill(&mut matrix, |_, _| 4);
        matrix.set(6, 6, 10);
        // the lone tile of a corner block carries the whole delta
        assert_eq!(matrix.block_sum(3, 3), 10);
        assert!(matrix.get(6, 6) > 4);
        assert_eq!(matrix.get(0, 0), 4);
    }

    #[test]
    fn test_set_perturbs_block_mates() {
        let mut matrix = DownsampledMatrix::new(4, 4);
        fill(&mut matrix, |_, _| 10);
        matrix.set(0, 0, 90);
        assert_eq!(matrix.block_sum(0, 0), 40 + 80);
        assert!(matrix.get(1, 1) > 10);
        assert_eq!(matrix.get(3, 3), 10);
    }

    #[test]
    fn test_single_block_axis() {
        let mut matrix = DownsampledMatrix::new(2, 2);
        fill(&mut matrix, |_, _| -6);
        assert_eq!(matrix.get(0, 0), -6);
        assert_eq!(matrix.get(1, 1), -6);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_panics() {
        let matrix = DownsampledMatrix::new(5, 5);
        matrix.get(0, 5);
    }
}
