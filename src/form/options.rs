use std::{rc::Rc, time::Duration};

use super::{
    error::FormError,
    schedule::{Clock, DEFAULT_NOTIFY_DEBOUNCE, SystemClock},
};

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Hands out ids for an instance and the bindings mounted on it.
///
/// Each instance owns its generator, so ids never leak between forms or tests.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    next: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn random() -> Self {
        Self::new(format!("form-{:08x}", rand::random::<u32>()))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_id(&mut self) -> String {
        self.next += 1;
        format!("{}-{}", self.prefix, self.next)
    }
}

#[derive(Debug, Clone)]
pub struct InstanceOptions {
    pub debounce: Duration,
    pub clock: Rc<dyn Clock>,
    pub ids: IdGenerator,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_NOTIFY_DEBOUNCE,
            clock: Rc::new(SystemClock),
            ids: IdGenerator::random(),
        }
    }
}

impl InstanceOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }
}

/// Size bounds consulted by the public add/remove entry points of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub min: usize,
    pub max: Option<usize>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self { min: 0, max: None }
    }
}

impl ListOptions {
    pub fn with_min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), FormError> {
        match self.max {
            Some(max) if self.min > max => Err(FormError::InvalidBounds { min: self.min, max }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    pub capacity: usize,
    pub debounce: Duration,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
            debounce: Duration::ZERO,
        }
    }
}

impl HistoryOptions {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_scoped_to_their_generator() {
        let mut a = IdGenerator::new("a");
        let mut b = IdGenerator::new("b");
        assert_eq!(a.next_id(), "a-1");
        assert_eq!(a.next_id(), "a-2");
        assert_eq!(b.next_id(), "b-1");
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let options = ListOptions::default().with_min(3).with_max(1);
        assert_eq!(
            options.validate(),
            Err(FormError::InvalidBounds { min: 3, max: 1 })
        );
        assert!(ListOptions::default().with_max(2).validate().is_ok());
    }
}
