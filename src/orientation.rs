use serde::{Deserialize, Serialize};

/// Four-way compass direction. North is towards increasing world y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub fn all() -> [Orientation; 4] {
        [Orientation::North, Orientation::East, Orientation::South, Orientation::West]
    }

    /// Quarter turns clockwise from north.
    pub fn rotation(&self) -> u32 {
        match self {
            Orientation::North => 0,
            Orientation::East => 1,
            Orientation::South => 2,
            Orientation::West => 3,
        }
    }

    /// Turn clockwise by `quarter_turns`.
    pub fn rotate(&self, quarter_turns: u32) -> Orientation {
        Self::all()[((self.rotation() + quarter_turns) % 4) as usize]
    }

    pub fn reverse(&self) -> Orientation {
        self.rotate(2)
    }

    /// Direction of an axis-aligned step, `None` for diagonal or zero deltas.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Orientation> {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Some(Orientation::North),
            (0, -1) => Some(Orientation::South),
            (1, 0) => Some(Orientation::East),
            (-1, 0) => Some(Orientation::West),
            _ => None,
        }
    }

    /// Unit step in world coordinates.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Orientation::North => (0, 1),
            Orientation::East => (1, 0),
            Orientation::South => (0, -1),
            Orientation::West => (-1, 0),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Orientation::North => "North",
            Orientation::East => "East",
            Orientation::South => "South",
            Orientation::West => "West",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_and_reverse() {
        assert_eq!(Orientation::North.rotate(1), Orientation::East);
        assert_eq!(Orientation::West.rotate(1), Orientation::North);
        assert_eq!(Orientation::South.rotate(6), Orientation::North);
        for o in Orientation::all() {
            assert_eq!(o.reverse().reverse(), o);
            assert_ne!(o.reverse(), o);
        }
    }

    #[test]
    fn test_from_delta_axis_aligned_only() {
        assert_eq!(Orientation::from_delta(0, 5), Some(Orientation::North));
        assert_eq!(Orientation::from_delta(0, -1), Some(Orientation::South));
        assert_eq!(Orientation::from_delta(-3, 0), Some(Orientation::West));
        assert_eq!(Orientation::from_delta(2, 0), Some(Orientation::East));
        assert_eq!(Orientation::from_delta(1, 1), None);
        assert_eq!(Orientation::from_delta(0, 0), None);
    }

    #[test]
    fn test_delta_matches_from_delta() {
        for o in Orientation::all() {
            let (dx, dy) = o.delta();
            assert_eq!(Orientation::from_delta(dx, dy), Some(o));
        }
    }
}
