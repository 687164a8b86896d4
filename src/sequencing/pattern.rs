use crate::{LANE_COUNT, PATTERN_STEPS};
use serde::{Deserialize, Serialize};

/// One row of sixteen steps per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternGrid(pub [[bool; PATTERN_STEPS]; LANE_COUNT]);

impl PatternGrid {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Out-of-range lanes or steps read as unset.
    pub fn is_set(&self, lane: usize, step: usize) -> bool {
        self.0
            .get(lane)
            .and_then(|row| row.get(step))
            .copied()
            .unwrap_or(false)
    }

    /// Out-of-range lanes or steps are ignored.
    pub fn set(&mut self, lane: usize, step: usize, on: bool) {
        if let Some(cell) = self.0.get_mut(lane).and_then(|row| row.get_mut(step)) {
            *cell = on;
        }
    }

    pub fn set_row(&mut self, lane: usize, row: [bool; PATTERN_STEPS]) {
        if let Some(target) = self.0.get_mut(lane) {
            *target = row;
        }
    }

    pub fn row(&self, lane: usize) -> Option<&[bool; PATTERN_STEPS]> {
        self.0.get(lane)
    }

    /// Fill `triggers` with the column at `step`.
    pub fn column(&self, step: usize, triggers: &mut [bool; LANE_COUNT]) {
        let step = step % PATTERN_STEPS;
        for (trigger, row) in triggers.iter_mut().zip(self.0.iter()) {
            *trigger = row[step];
        }
    }

    /// Parse a row from a string of `x`/`.` characters, e.g. `"x...x...x...x..."`.
    pub fn row_from_str(steps: &str) -> [bool; PATTERN_STEPS] {
        let mut row = [false; PATTERN_STEPS];
        for (cell, ch) in row.iter_mut().zip(steps.chars()) {
            *cell = matches!(ch, 'x' | 'X' | '1');
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_read_cells() {
        let mut grid = PatternGrid::empty();
        grid.set(0, 0, true);
        grid.set(8, 15, true);
        grid.set(LANE_COUNT, 0, true);
        grid.set(0, PATTERN_STEPS, true);

        assert!(grid.is_set(0, 0));
        assert!(grid.is_set(8, 15));
        assert!(!grid.is_set(1, 0));
        assert!(!grid.is_set(LANE_COUNT, 0));
    }

    #[test]
    fn test_column_extraction() {
        let mut grid = PatternGrid::empty();
        grid.set_row(0, PatternGrid::row_from_str("x...x...x...x..."));
        grid.set_row(2, PatternGrid::row_from_str("xxxxxxxxxxxxxxxx"));

        let mut triggers = [false; LANE_COUNT];
        grid.column(4, &mut triggers);
        assert!(triggers[0]);
        assert!(!triggers[1]);
        assert!(triggers[2]);

        grid.column(5, &mut triggers);
        assert!(!triggers[0]);
        assert!(triggers[2]);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut grid = PatternGrid::empty();
        grid.set(3, 7, true);
        let json = serde_json::to_string(&grid).unwrap();
        let back: PatternGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(grid, back);
    }
}
