use serde::{Deserialize, Serialize};

use super::{CompactMatrix, IntegerMatrix};

/// Categorical grid backed by an index grid and an append-only catalog of
/// distinct values.
///
/// Index `0` means the cell is empty; index `k` refers to `catalog[k - 1]`.
/// Writing a value already in the catalog reuses its slot, so the catalog
/// never grows past the number of distinct values ever written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectMatrix<T> {
    indices: CompactMatrix,
    catalog: Vec<T>,
}

impl<T: PartialEq + Clone> ObjectMatrix<T> {
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Self {
            indices: CompactMatrix::new(size_x, size_y),
            catalog: Vec::new(),
        }
    }

    pub fn size_x(&self) -> usize {
        self.indices.size_x()
    }

    pub fn size_y(&self) -> usize {
        self.indices.size_y()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        match self.indices.get(x, y) {
            0 => None,
            k => self.catalog.get(k as usize - 1),
        }
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let slot = match self.catalog.iter().position(|v| *v == value) {
            Some(slot) => slot,
            None => {
                self.catalog.push(value);
                self.catalog.len() - 1
            }
        };
        self.indices.set(x, y, slot as i32 + 1);
    }

    /// Write `Some(value)` or empty the cell.
    pub fn replace(&mut self, x: usize, y: usize, value: Option<T>) {
        match value {
            Some(value) => self.set(x, y, value),
            None => self.clear(x, y),
        }
    }

    /// Empty the cell. The catalog keeps the value it pointed at.
    pub fn clear(&mut self, x: usize, y: usize) {
        self.indices.set(x, y, 0);
    }

    /// Every distinct value written so far, in first-write order.
    pub fn catalog(&self) -> &[T] {
        &self.catalog
    }

    /// Raw index grid (`0` = empty).
    pub fn indices(&self) -> &CompactMatrix {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_by_default() {
        let matrix: ObjectMatrix<u16> = ObjectMatrix::new(3, 3);
        assert_eq!(matrix.get(1, 1), None);
        assert!(matrix.catalog().is_empty());
    }

    #[test]
    fn test_values_are_deduplicated() {
        let mut matrix = ObjectMatrix::new(4, 4);
        let mut writes = 0;
        for y in 0..4 {
            for x in 0..4 {
                matrix.set(x, y, if (x + y) % 2 == 0 { "clay" } else { "sand" });
                writes += 1;
            }
        }
        assert_eq!(matrix.catalog(), &["clay", "sand"]);
        assert!(matrix.catalog().len() <= writes);
        assert_eq!(matrix.get(0, 0), Some(&"clay"));
        assert_eq!(matrix.get(1, 0), Some(&"sand"));
    }

    #[test]
    fn test_clear_keeps_catalog() {
        let mut matrix = ObjectMatrix::new(2, 2);
        matrix.set(0, 0, 7u16);
        matrix.clear(0, 0);
        assert_eq!(matrix.get(0, 0), None);
        assert_eq!(matrix.catalog(), &[7]);

        matrix.replace(1, 1, Some(7));
        assert_eq!(matrix.get(1, 1), Some(&7));
        assert_eq!(matrix.catalog().len(), 1);
    }

    #[test]
    fn test_indices_stay_valid() {
        let mut matrix = ObjectMatrix::new(5, 5);
        for i in 0..25usize {
            matrix.set(i % 5, i / 5, (i % 7) as u32);
        }
        for y in 0..5 {
            for x in 0..5 {
                let index = matrix.indices().get(x, y);
                assert!(index >= 1 && index as usize <= matrix.catalog().len());
            }
        }
    }
}
