use std::ops::Range;

/// Selection index plus the first visible row of a scrolling list.
///
/// The selection always stays inside the viewport: when it moves past an
/// edge, the offset shifts by exactly the amount needed to bring it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    selected: usize,
    offset: usize,
    len: usize,
    viewport: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            selected: 0,
            offset: 0,
            len: 0,
            viewport: 1,
        }
    }
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// The selected index, or `None` when there is nothing to select.
    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.selected)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn visible_range(&self) -> Range<usize> {
        self.offset..(self.offset + self.viewport).min(self.len)
    }

    /// Changes the item count, keeping the selection in bounds.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        self.selected = self.selected.min(len.saturating_sub(1));
        self.offset = self.offset.min(len.saturating_sub(1));
        self.follow();
    }

    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        self.follow();
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.len.saturating_sub(1));
        self.follow();
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.len == 0 {
            return;
        }
        let target = self.selected.saturating_add_signed(delta);
        self.select(target);
    }

    pub fn page_down(&mut self) {
        self.move_by(self.viewport as isize);
    }

    pub fn page_up(&mut self) {
        self.move_by(-(self.viewport as isize));
    }

    pub fn home(&mut self) {
        self.select(0);
    }

    pub fn end(&mut self) {
        self.select(self.len.saturating_sub(1));
    }

    pub fn reset(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    fn follow(&mut self) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + self.viewport {
            self.offset = self.selected + 1 - self.viewport;
        }
    }
}
