//! Region traversal.
//!
//! Cursors walk a rectangle row by row (x fastest, both ascending). They hold
//! a copy of the terrain [`Layout`] instead of a borrow, so a pass can read a
//! position from a cursor and then mutate the terrain at it.
//!
//! A cursor that has not yielded anything yet can be split into two cursors
//! whose sequences concatenate to the original one, which is what
//! [`par_fold`] uses to spread read-only passes over rayon's pool.

use crate::chunk::ChunkPos;
use crate::terrain::{AxisLayout, Layout, TilePos};

/// Below this many remaining tiles [`par_fold`] stops splitting.
pub const SEQUENTIAL_THRESHOLD: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Stepping a cursor past either end of its range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    Exhausted { direction: Direction },
}

impl std::fmt::Display for RegionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionError::Exhausted { direction } => {
                write!(f, "Cursor exhausted moving {}", direction)
            }
        }
    }
}

impl std::error::Error for RegionError {}

// =============================================================================
// WALK
// =============================================================================

/// What a successful step did to the position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// Yield the current position without moving
    Stay,
    /// Moved one column within the row
    Column,
    /// Wrapped to the other end of the adjacent row
    Row,
}

/// Row-major position bookkeeping shared by the tile and chunk cursors.
///
/// `primed` is set when the current position has not been yielded yet: a
/// fresh walk is primed forward (the first `next` yields the start), a walk
/// reset to its end is primed backward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Walk {
    width: usize,
    height: usize,
    col: usize,
    row: usize,
    primed: Option<Direction>,
}

impl Walk {
    fn new(width: usize, height: usize) -> Self {
        Self { width, height, col: 0, row: 0, primed: Some(Direction::Forward) }
    }

    fn len(&self) -> usize {
        self.width * self.height
    }

    fn linear(&self) -> usize {
        self.row * self.width + self.col
    }

    fn at_start(&self) -> bool {
        self.col == 0 && self.row == 0
    }

    fn at_end(&self) -> bool {
        self.col + 1 == self.width && self.row + 1 == self.height
    }

    fn is_unstarted(&self) -> bool {
        self.primed == Some(Direction::Forward) && self.at_start()
    }

    fn reset_to_start(&mut self) {
        self.col = 0;
        self.row = 0;
        self.primed = Some(Direction::Forward);
    }

    fn reset_to_end(&mut self) {
        self.col = self.width - 1;
        self.row = self.height - 1;
        self.primed = Some(Direction::Backward);
    }

    fn has_next(&self) -> bool {
        match self.primed {
            Some(Direction::Forward) => true,
            Some(Direction::Backward) => false,
            None => !self.at_end(),
        }
    }

    fn has_previous(&self) -> bool {
        match self.primed {
            Some(Direction::Backward) => true,
            Some(Direction::Forward) => false,
            None => !self.at_start(),
        }
    }

    fn next(&mut self) -> Result<Step, RegionError> {
        if !self.has_next() {
            return Err(RegionError::Exhausted { direction: Direction::Forward });
        }
        if self.primed.take().is_some() {
            return Ok(Step::Stay);
        }
        if self.col + 1 == self.width {
            self.col = 0;
            self.row += 1;
            Ok(Step::Row)
        } else {
            self.col += 1;
            Ok(Step::Column)
        }
    }

    fn previous(&mut self) -> Result<Step, RegionError> {
        if !self.has_previous() {
            return Err(RegionError::Exhausted { direction: Direction::Backward });
        }
        if self.primed.take().is_some() {
            return Ok(Step::Stay);
        }
        if self.col == 0 {
            self.col = self.width - 1;
            self.row -= 1;
            Ok(Step::Row)
        } else {
            self.col -= 1;
            Ok(Step::Column)
        }
    }

    /// Elements a forward traversal would still yield.
    fn remaining(&self) -> usize {
        match self.primed {
            Some(Direction::Forward) => self.len() - self.linear(),
            Some(Direction::Backward) => 0,
            None => self.len() - self.linear() - 1,
        }
    }

    /// Split point as `(rows, cols)` kept by the prefix, `None` for one cell.
    fn split_point(&self) -> Option<(usize, usize)> {
        if self.height > 1 {
            Some((self.height.div_ceil(2), self.width))
        } else if self.width > 1 {
            Some((1, self.width.div_ceil(2)))
        } else {
            None
        }
    }
}

// =============================================================================
// TILE CURSOR
// =============================================================================

/// Chunk index and local offset along one axis. The chunk index may leave
/// `[0, chunks)` on a bounded axis, in which case the position has no tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AxisPoint {
    chunk: isize,
    local: usize,
}

impl AxisPoint {
    fn of(axis: &AxisLayout, coordinate: i64) -> Self {
        let mut index = coordinate + axis.base;
        if axis.cyclic {
            index = index.rem_euclid(axis.playable_size);
        }
        Self {
            chunk: index.div_euclid(axis.chunk_size) as isize,
            local: index.rem_euclid(axis.chunk_size) as usize,
        }
    }

    fn increase(&mut self, axis: &AxisLayout) {
        self.local += 1;
        if self.local as i64 == axis.chunk_size {
            self.local = 0;
            self.chunk += 1;
            if axis.cyclic && self.chunk == axis.chunks as isize {
                self.chunk = 0;
            }
        }
    }

    fn decrease(&mut self, axis: &AxisLayout) {
        if self.local == 0 {
            self.local = axis.chunk_size as usize - 1;
            self.chunk -= 1;
            if axis.cyclic && self.chunk == -1 {
                self.chunk = axis.chunks as isize - 1;
            }
        } else {
            self.local -= 1;
        }
    }

    fn chunk_index(&self, axis: &AxisLayout) -> Option<usize> {
        usize::try_from(self.chunk).ok().filter(|&c| c < axis.chunks)
    }
}

/// Lazy, bidirectional, splittable cursor over a rectangle of world tiles.
///
/// Positions outside the materialized chunks of a bounded axis are yielded
/// as `None` so callers can skip them uniformly. On a cyclic axis the range
/// may cross the seam and continues on the other side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileCursor {
    layout: Layout,
    from_x: i64,
    from_y: i64,
    walk: Walk,
    start_x: AxisPoint,
    start_y: AxisPoint,
    end_x: AxisPoint,
    end_y: AxisPoint,
    x: AxisPoint,
    y: AxisPoint,
}

impl TileCursor {
    /// Cursor over the rectangle with corners `(from_x, from_y)` and
    /// `(to_x, to_y)`, inclusive, in any order.
    pub fn new(layout: Layout, from_x: i64, from_y: i64, to_x: i64, to_y: i64) -> Self {
        let (from_x, to_x) = (from_x.min(to_x), from_x.max(to_x));
        let (from_y, to_y) = (from_y.min(to_y), from_y.max(to_y));
        let width = (to_x - from_x + 1) as usize;
        let height = (to_y - from_y + 1) as usize;
        Self::with_span(layout, from_x, from_y, width, height)
    }

    fn with_span(layout: Layout, from_x: i64, from_y: i64, width: usize, height: usize) -> Self {
        let start_x = AxisPoint::of(&layout.x, from_x);
        let start_y = AxisPoint::of(&layout.y, from_y);
        Self {
            layout,
            from_x,
            from_y,
            walk: Walk::new(width, height),
            start_x,
            start_y,
            end_x: AxisPoint::of(&layout.x, from_x + width as i64 - 1),
            end_y: AxisPoint::of(&layout.y, from_y + height as i64 - 1),
            x: start_x,
            y: start_y,
        }
    }

    pub fn width(&self) -> usize {
        self.walk.width
    }

    pub fn height(&self) -> usize {
        self.walk.height
    }

    /// Total number of positions in the range.
    pub fn len(&self) -> usize {
        self.walk.len()
    }

    pub fn is_empty(&self) -> bool {
        self.walk.len() == 0
    }

    /// Tile under the cursor, `None` outside the materialized chunks.
    pub fn current(&self) -> Option<TilePos> {
        let chunk_x = self.x.chunk_index(&self.layout.x)?;
        let chunk_y = self.y.chunk_index(&self.layout.y)?;
        Some(TilePos::new(ChunkPos::new(chunk_x, chunk_y), self.x.local, self.y.local))
    }

    /// World coordinates under the cursor, not wrapped: they increase
    /// monotonically across a cyclic seam.
    pub fn current_coords(&self) -> (i64, i64) {
        (
            self.from_x + self.walk.col as i64,
            self.from_y + self.walk.row as i64,
        )
    }

    pub fn has_next(&self) -> bool {
        self.walk.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.walk.has_previous()
    }

    pub fn try_next(&mut self) -> Result<Option<TilePos>, RegionError> {
        let step = self.walk.next().inspect_err(|e| log::trace!("{}", e))?;
        match step {
            Step::Stay => {}
            Step::Column => self.x.increase(&self.layout.x),
            Step::Row => {
                self.x = self.start_x;
                self.y.increase(&self.layout.y);
            }
        }
        Ok(self.current())
    }

    pub fn try_previous(&mut self) -> Result<Option<TilePos>, RegionError> {
        let step = self.walk.previous().inspect_err(|e| log::trace!("{}", e))?;
        match step {
            Step::Stay => {}
            Step::Column => self.x.decrease(&self.layout.x),
            Step::Row => {
                self.x = self.end_x;
                self.y.decrease(&self.layout.y);
            }
        }
        Ok(self.current())
    }

    pub fn reset_to_start(&mut self) {
        self.walk.reset_to_start();
        self.x = self.start_x;
        self.y = self.start_y;
    }

    pub fn reset_to_end(&mut self) {
        self.walk.reset_to_end();
        self.x = self.end_x;
        self.y = self.end_y;
    }

    /// Positions a forward traversal would still yield.
    pub fn estimate_size(&self) -> usize {
        self.walk.remaining()
    }

    /// Split an unstarted cursor: `self` keeps the first half (by rows, or
    /// by columns for a single row) and the second half is returned.
    pub fn try_split(&mut self) -> Option<TileCursor> {
        if !self.walk.is_unstarted() {
            return None;
        }
        let (rows, cols) = self.walk.split_point()?;
        let (width, height) = (self.walk.width, self.walk.height);
        let suffix = if rows < height {
            Self::with_span(self.layout, self.from_x, self.from_y + rows as i64, width, height - rows)
        } else {
            Self::with_span(self.layout, self.from_x + cols as i64, self.from_y, width - cols, 1)
        };
        log::trace!(
            "split {}x{} region into {}x{} + {}x{}",
            width,
            height,
            cols,
            rows,
            suffix.width(),
            suffix.height()
        );
        *self = Self::with_span(self.layout, self.from_x, self.from_y, cols, rows);
        Some(suffix)
    }
}

impl Iterator for TileCursor {
    type Item = Option<TilePos>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.estimate_size();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileCursor {}

// =============================================================================
// CHUNK CURSOR
// =============================================================================

/// Cursor over every materialized chunk, row by row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkCursor {
    layout: Layout,
    origin: ChunkPos,
    walk: Walk,
}

impl ChunkCursor {
    pub fn new(layout: Layout) -> Self {
        Self::with_span(layout, ChunkPos::new(0, 0), layout.x.chunks, layout.y.chunks)
    }

    fn with_span(layout: Layout, origin: ChunkPos, width: usize, height: usize) -> Self {
        Self { layout, origin, walk: Walk::new(width, height) }
    }

    pub fn current(&self) -> ChunkPos {
        ChunkPos::new(self.origin.x + self.walk.col, self.origin.y + self.walk.row)
    }

    /// World coordinates of the centre tile of the current chunk.
    pub fn center(&self) -> (i64, i64) {
        self.layout.chunk_center(self.current())
    }

    pub fn has_next(&self) -> bool {
        self.walk.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.walk.has_previous()
    }

    pub fn try_next(&mut self) -> Result<ChunkPos, RegionError> {
        self.walk.next()?;
        Ok(self.current())
    }

    pub fn try_previous(&mut self) -> Result<ChunkPos, RegionError> {
        self.walk.previous()?;
        Ok(self.current())
    }

    pub fn reset_to_start(&mut self) {
        self.walk.reset_to_start();
    }

    pub fn reset_to_end(&mut self) {
        self.walk.reset_to_end();
    }

    pub fn estimate_size(&self) -> usize {
        self.walk.remaining()
    }

    pub fn try_split(&mut self) -> Option<ChunkCursor> {
        if !self.walk.is_unstarted() {
            return None;
        }
        let (rows, cols) = self.walk.split_point()?;
        let (width, height) = (self.walk.width, self.walk.height);
        let suffix = if rows < height {
            let origin = ChunkPos::new(self.origin.x, self.origin.y + rows);
            Self::with_span(self.layout, origin, width, height - rows)
        } else {
            let origin = ChunkPos::new(self.origin.x + cols, self.origin.y);
            Self::with_span(self.layout, origin, width - cols, 1)
        };
        *self = Self::with_span(self.layout, self.origin, cols, rows);
        Some(suffix)
    }
}

impl Iterator for ChunkCursor {
    type Item = ChunkPos;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.estimate_size();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkCursor {}

// =============================================================================
// PARALLEL TRAVERSAL
// =============================================================================

/// Divide-and-conquer fold over a cursor's tiles.
///
/// The cursor is split recursively with [`TileCursor::try_split`] and the
/// halves folded on rayon's pool. Only meant for read-only passes; `reduce`
/// must be associative for the result to match a sequential fold.
pub fn par_fold<A, I, F, R>(mut cursor: TileCursor, identity: &I, fold: &F, reduce: &R) -> A
where
    A: Send,
    I: Fn() -> A + Sync,
    F: Fn(A, TilePos) -> A + Sync,
    R: Fn(A, A) -> A + Sync,
{
    if cursor.estimate_size() > SEQUENTIAL_THRESHOLD {
        if let Some(suffix) = cursor.try_split() {
            let (a, b) = rayon::join(
                || par_fold(cursor, identity, fold, reduce),
                || par_fold(suffix, identity, fold, reduce),
            );
            return reduce(a, b);
        }
    }
    cursor.flatten().fold(identity(), fold)
}
