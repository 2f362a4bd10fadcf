use crate::cursor::Cursor;
use crate::event::RawEvent;

/// Cursor over the raw feed in arrival order, one row per event.
#[derive(Debug, Clone, Default)]
pub struct EventListState {
    cursor: Cursor,
}

impl EventListState {
    pub fn set_len(&mut self, len: usize) {
        self.cursor.set_len(len);
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn move_selection(&mut self, delta: isize) {
        self.cursor.move_by(delta);
    }

    pub fn page_down(&mut self) {
        self.cursor.page_down();
    }

    pub fn page_up(&mut self) {
        self.cursor.page_up();
    }

    pub fn home(&mut self) {
        self.cursor.home();
    }

    pub fn end(&mut self) {
        self.cursor.end();
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.cursor.set_viewport(rows);
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.cursor.current()
    }

    pub fn selected<'a>(&self, events: &'a [RawEvent]) -> Option<&'a RawEvent> {
        self.selected_index().and_then(|i| events.get(i))
    }

    /// Moves to the event with `id`. Returns false when it is not in the feed.
    pub fn select_event(&mut self, events: &[RawEvent], id: i64) -> bool {
        match events.iter().position(|e| e.id == id) {
            Some(index) => {
                self.cursor.select(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::order_history;

    #[test]
    fn select_event_by_id() {
        let events = order_history();
        let mut list = EventListState::default();
        list.set_len(events.len());
        assert!(list.select_event(&events, 9));
        assert_eq!(list.selected(&events).unwrap().event_type, "WorkflowExecutionSignaled");
        assert!(!list.select_event(&events, 99));
    }

    #[test]
    fn empty_feed_has_no_selection() {
        let mut list = EventListState::default();
        list.move_selection(3);
        assert_eq!(list.selected_index(), None);
    }
}
