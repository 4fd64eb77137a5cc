//! Page controllers
//!
//! Each controller owns the mutable state of one page and talks to the
//! record service, the preferences and the device only through the handles
//! it was built with.

mod forms;
mod inventory;
mod locations;
mod session;

pub use forms::*;
pub use inventory::*;
pub use locations::*;
pub use session::*;

/// Result of a successful form submission, carrying the record id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(String),
    Updated(String),
}

impl SubmitOutcome {
    pub fn id(&self) -> &str {
        match self {
            SubmitOutcome::Created(id) | SubmitOutcome::Updated(id) => id,
        }
    }
}

/// A confirmation dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub message: String,
}
