use std::sync::Mutex;

use crate::ui;

/// Collector for errors that are fatal to the whole run. They accumulate
/// during parsing and catalog validation so a single run reports every
/// problem, then the pipeline aborts at the gate if any were recorded.
#[derive(Default)]
pub struct ErrorList {
    errors: Mutex<Vec<String>>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&self, e: impl Into<String>) {
        let e = e.into();
        ui::error(format!("ERROR: {e}"));
        self.errors.lock().expect("error list poisoned").push(e);
    }

    pub fn len(&self) -> usize {
        self.errors.lock().expect("error list poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numbered dump of everything collected, for the abort message.
    pub fn dump(&self) -> Vec<String> {
        self.errors
            .lock()
            .expect("error list poisoned")
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}: {}", i + 1, e))
            .collect()
    }
}
