use serde::{Deserialize, Serialize};

use super::{cell_offset, IntegerMatrix};

/// Width of a single backing cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellWidth {
    Byte,
    Short,
    Int,
}

impl CellWidth {
    pub fn bytes(&self) -> usize {
        match self {
            CellWidth::Byte => 1,
            CellWidth::Short => 2,
            CellWidth::Int => 4,
        }
    }

    /// Narrowest width able to hold `value`.
    pub fn fitting(value: i32) -> Self {
        if i8::try_from(value).is_ok() {
            CellWidth::Byte
        } else if i16::try_from(value).is_ok() {
            CellWidth::Short
        } else {
            CellWidth::Int
        }
    }
}

impl std::fmt::Display for CellWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-byte", self.bytes())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum Backing {
    Bytes(Vec<i8>),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
}

/// Exact integer grid whose cells start at one byte and widen when a
/// written value no longer fits. Widening copies every cell sign-extended
/// and is never undone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompactMatrix {
    size_x: usize,
    size_y: usize,
    backing: Backing,
}

impl CompactMatrix {
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Self {
            size_x,
            size_y,
            backing: Backing::Bytes(vec![0; size_x * size_y]),
        }
    }

    /// Current backing cell width.
    pub fn width(&self) -> CellWidth {
        match &self.backing {
            Backing::Bytes(_) => CellWidth::Byte,
            Backing::Shorts(_) => CellWidth::Short,
            Backing::Ints(_) => CellWidth::Int,
        }
    }

    /// Approximate heap footprint of the cells.
    pub fn memory_bytes(&self) -> usize {
        self.size_x * self.size_y * self.width().bytes()
    }

    /// Widen the backing array to at least `target`.
    fn widen_to(&mut self, target: CellWidth) {
        if target <= self.width() {
            return;
        }
        log::trace!(
            "widening {}x{} matrix from {} to {}",
            self.size_x,
            self.size_y,
            self.width(),
            target
        );
        let backing = std::mem::replace(&mut self.backing, Backing::Bytes(Vec::new()));
        self.backing = match (backing, target) {
            (Backing::Bytes(cells), CellWidth::Short) => {
                Backing::Shorts(cells.into_iter().map(i16::from).collect())
            }
            (Backing::Bytes(cells), _) => Backing::Ints(cells.into_iter().map(i32::from).collect()),
            (Backing::Shorts(cells), _) => {
                Backing::Ints(cells.into_iter().map(i32::from).collect())
            }
            (ints, _) => ints,
        };
    }
}

impl IntegerMatrix for CompactMatrix {
    fn size_x(&self) -> usize {
        self.size_x
    }

    fn size_y(&self) -> usize {
        self.size_y
    }

    fn get(&self, x: usize, y: usize) -> i32 {
        let offset = cell_offset(self.size_x, self.size_y, x, y);
        match &self.backing {
            Backing::Bytes(cells) => i32::from(cells[offset]),
            Backing::Shorts(cells) => i32::from(cells[offset]),
            Backing::Ints(cells) => cells[offset],
        }
    }

    fn set(&mut self, x: usize, y: usize, value: i32) {
        let offset = cell_offset(self.size_x, self.size_y, x, y);
        self.widen_to(CellWidth::fitting(value));
        // widen_to guarantees the casts below are lossless
        match &mut self.backing {
            Backing::Bytes(cells) => cells[offset] = value as i8,
            Backing::Shorts(cells) => cells[offset] = value as i16,
            Backing::Ints(cells) => cells[offset] = value,
        }
    }
}
