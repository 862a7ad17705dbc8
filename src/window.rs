/// Items scrolled per wheel notch.
pub const WHEEL_STEP: i64 = 5;

/// The visible slice of an item sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub first_item: usize,
    pub page_size: usize,
    pub items_len: usize,
}

impl Window {
    pub const fn new(page_size: usize) -> Self {
        Self {
            first_item: 0,
            page_size,
            items_len: 0,
        }
    }

    /// Highest first item allowed: half a page of items stays visible at the end.
    pub fn last_first(&self) -> usize {
        self.items_len.saturating_sub((self.page_size / 2).max(1))
    }

    /// Moves the window, clamping out of range requests. Returns whether it moved.
    pub fn set_first(&mut self, first: i64) -> bool {
        let first = if first < 0 || self.items_len <= self.page_size {
            0
        } else {
            (first as u64).min(self.last_first() as u64) as usize
        };
        let moved = first != self.first_item;
        self.first_item = first;
        moved
    }

    /// Updates the item count and re-clamps the current position.
    pub fn set_len(&mut self, items_len: usize) {
        self.items_len = items_len;
        self.set_first(self.first_item as i64);
    }

    pub fn reset(&mut self) {
        self.first_item = 0;
    }

    pub fn moveto(&mut self, fraction: f64) -> bool {
        self.set_first((self.items_len as f64 * fraction + 0.5) as i64)
    }

    pub fn scroll_units(&mut self, units: i64) -> bool {
        self.set_first(self.first_item as i64 + units)
    }

    /// Scrolls one notch at a time so that every step is clamped.
    pub fn scroll_wheel(&mut self, notches: i64) -> bool {
        let mut moved = false;
        for _ in 0..notches.unsigned_abs() {
            moved |= self.scroll_units(notches.signum() * WHEEL_STEP);
        }
        moved
    }

    pub fn scroll_pages(&mut self, pages: i64) -> bool {
        self.set_first(self.first_item as i64 + pages * self.page_size as i64)
    }

    /// Scrollbar thumb as fractions of the item count.
    pub fn scrollbar(&self) -> (f64, f64) {
        if self.items_len == 0 {
            return (0.0, 1.0);
        }
        let len = self.items_len as f64;
        (
            self.first_item as f64 / len,
            (self.first_item + self.page_size / 2) as f64 / len,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn window(items_len: usize) -> Window {
        Window {
            first_item: 0,
            page_size: 40,
            items_len,
        }
    }

    #[test]
    fn clamps_past_end() {
        let mut w = window(100);
        assert!(w.set_first(1000));
        assert_eq!(w.first_item, 80);
        w.set_first(-3);
        assert_eq!(w.first_item, 0);
    }

    #[test]
    fn short_sources_stay_at_top() {
        let mut w = window(40);
        assert!(!w.set_first(10));
        assert_eq!(w.first_item, 0);
    }

    #[test]
    fn wheel_and_pages() {
        let mut w = window(1000);
        w.scroll_wheel(3);
        assert_eq!(w.first_item, 15);
        w.scroll_wheel(-1);
        assert_eq!(w.first_item, 10);
        w.scroll_pages(2);
        assert_eq!(w.first_item, 90);
        w.moveto(0.5);
        assert_eq!(w.first_item, 500);
        assert_eq!(w.scrollbar(), (0.5, 0.52));
    }

    #[test]
    fn shrinking_reclamps() {
        let mut w = window(1000);
        w.set_first(900);
        w.set_len(200);
        assert_eq!(w.first_item, 180);
    }

    proptest! {
        #[test]
        fn first_item_always_in_range(
            len in 0usize..5000,
            page in 1usize..100,
            first in -10_000i64..10_000,
        ) {
            let mut w = Window { first_item: 0, page_size: page, items_len: len };
            w.set_first(first);
            if len <= page {
                prop_assert_eq!(w.first_item, 0);
            } else {
                prop_assert!(w.first_item < len);
                prop_assert!(w.first_item + (page / 2).max(1) <= len);
            }
        }
    }
}
