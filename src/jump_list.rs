use crate::addr_space::Location;

/// Where a disassembly view stood: the source it showed and its first item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub source: Location,
    pub first_item: usize,
}

/// Back and forward history of jumps, across sources.
///
/// `history[..cursor]` lies behind the current position.
#[derive(Debug, Clone, Default)]
pub struct JumpList {
    history: Vec<Position>,
    cursor: usize,
}

impl JumpList {
    /// Records a jump. Any forward history is dropped.
    pub fn record(&mut self, from: Position, to: Position) {
        self.history.truncate(self.cursor);
        for position in [from, to] {
            if self.history.last() != Some(&position) {
                self.history.push(position);
            }
        }
        self.cursor = self.history.len();
    }

    /// Steps back to the newest recorded position other than `here`.
    pub fn back(&mut self, here: Position) -> Option<Position> {
        while self.cursor > 0 {
            self.cursor -= 1;
            let position = self.history[self.cursor];
            if position != here {
                return Some(position);
            }
        }
        None
    }

    pub fn forward(&mut self) -> Option<Position> {
        if self.cursor + 1 >= self.history.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.history[self.cursor])
    }
}
