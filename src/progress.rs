//! Fill progress tracking.
//!
//! [`FillProgress`] is the explicit state object the filler threads through a
//! run. It changes only through [`FillProgress::advance_table`] and
//! [`FillProgress::row_generated`], and each change fires the callback once
//! with a full [`ProgressSnapshot`].

/// Progress state after a change
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    /// Table currently being filled
    pub table: String,
    /// Rows inserted into the current table so far
    pub rows_generated: u64,
    /// Rows the current table still needed when it started
    pub rows_target: u64,
    /// Tables started so far, the current one included
    pub tables_completed: usize,
    /// Tables this run will fill
    pub tables_total: usize,
}

/// Stateful progress observer driven by the filler.
pub struct FillProgress {
    state: ProgressSnapshot,
    callback: Option<Box<dyn FnMut(&ProgressSnapshot)>>,
}

impl FillProgress {
    /// Progress tracker that only keeps state
    pub fn new() -> Self {
        Self {
            state: ProgressSnapshot::default(),
            callback: None,
        }
    }

    /// Progress tracker that reports every change to `callback`
    pub fn with_callback<F>(callback: F) -> Self
    where
        F: FnMut(&ProgressSnapshot) + 'static,
    {
        Self {
            state: ProgressSnapshot::default(),
            callback: Some(Box::new(callback)),
        }
    }

    /// Set how many tables the run will fill
    pub fn set_tables_total(&mut self, total: usize) {
        self.state.tables_total = total;
    }

    /// Move on to `table`, which needs `rows_to_generate` more rows
    pub fn advance_table(&mut self, table: &str, rows_to_generate: u64) {
        self.state.table = table.to_string();
        self.state.rows_target = rows_to_generate;
        self.state.rows_generated = 0;
        self.state.tables_completed += 1;
        self.notify();
    }

    /// Record one successfully inserted statement
    pub fn row_generated(&mut self) {
        self.state.rows_generated += 1;
        self.notify();
    }

    /// Current state
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.state
    }

    fn notify(&mut self) {
        if let Some(callback) = self.callback.as_mut() {
            callback(&self.state);
        }
    }
}

impl Default for FillProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_each_change_notifies_once() {
        let seen: Rc<RefCell<Vec<ProgressSnapshot>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut progress = FillProgress::with_callback(move |s| sink.borrow_mut().push(s.clone()));
        progress.set_tables_total(2);

        progress.advance_table("department", 2);
        progress.row_generated();
        progress.row_generated();
        progress.advance_table("employee", 1);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[2].rows_generated, 2);
        assert_eq!(seen[2].rows_target, 2);
        assert_eq!(
            seen[3],
            ProgressSnapshot {
                table: "employee".to_string(),
                rows_generated: 0,
                rows_target: 1,
                tables_completed: 2,
                tables_total: 2,
            }
        );
    }

    #[test]
    fn test_without_callback_tracks_state() {
        let mut progress = FillProgress::new();
        progress.advance_table("t", 3);
        progress.row_generated();
        assert_eq!(progress.snapshot().rows_generated, 1);
        assert_eq!(progress.snapshot().tables_completed, 1);
    }
}
