use std::time::Instant;

use serde::Serialize;

use crate::value::FormValue;

/// Snapshot handed to listeners and returned by `Instance::payload`.
#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub id: String,
    pub value: FormValue,
    pub errors: FormValue,
    pub errors_count: usize,
    pub changes_count: u64,
    pub changed: bool,
    #[serde(skip)]
    pub last_change: Option<Instant>,
    #[serde(skip)]
    pub last_submit: Option<Instant>,
}

impl Payload {
    pub fn is_valid(&self) -> bool {
        self.errors_count == 0
    }
}
