//! Cursor arithmetic for the two question sequences.
//!
//! Normal mode clamps at both ends of the catalog. Review mode wraps around
//! the mistake queue.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Clamp a stored index into `[0, len - 1]`. An empty sequence yields 0.
#[must_use]
pub fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// Move one step without wrapping.
#[must_use]
pub fn step_clamped(index: usize, len: usize, direction: Direction) -> usize {
    let index = clamp_index(index, len);
    match direction {
        Direction::Next => clamp_index(index.saturating_add(1), len),
        Direction::Previous => index.saturating_sub(1),
    }
}

/// Move forward one step, wrapping from the last entry to the first.
#[must_use]
pub fn step_cyclic(index: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (index + 1) % len
}

#[must_use]
pub fn has_next(index: usize, len: usize) -> bool {
    index + 1 < len
}

#[must_use]
pub fn has_previous(index: usize) -> bool {
    index > 0
}
