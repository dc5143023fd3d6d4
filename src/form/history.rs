use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use tracing::debug;

use super::{
    actions::{ChangeAction, HistoryKind},
    error::FormError,
    instance::{Instance, ListenerId},
    options::HistoryOptions,
    schedule::{Clock, Debouncer},
};
use crate::value::FormValue;

/// Capacity-bounded undo/redo stack of value snapshots.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<FormValue>,
    cursor: usize,
    capacity: usize,
}

impl History {
    pub fn new(initial: FormValue, capacity: usize) -> Result<Self, FormError> {
        if capacity == 0 {
            return Err(FormError::InvalidCapacity);
        }
        Ok(Self {
            entries: VecDeque::from([initial]),
            cursor: 0,
            capacity,
        })
    }

    pub fn current(&self) -> &FormValue {
        &self.entries[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Records a new snapshot, dropping any redo tail and evicting the oldest
    /// entry beyond capacity. A snapshot equal to the current one is ignored.
    pub fn push(&mut self, value: FormValue) -> bool {
        if value == *self.current() {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(value);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        true
    }

    pub fn replace_current(&mut self, value: FormValue) {
        self.entries[self.cursor] = value;
    }

    pub fn undo(&mut self) -> Option<FormValue> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current().clone())
    }

    pub fn redo(&mut self) -> Option<FormValue> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current().clone())
    }

    /// Forgets everything except the current snapshot.
    pub fn clear(&mut self) {
        let current = self.current().clone();
        self.entries = VecDeque::from([current]);
        self.cursor = 0;
    }
}

#[derive(Debug)]
struct BridgeState {
    history: History,
    pending: Debouncer<FormValue>,
}

impl BridgeState {
    fn flush_pending(&mut self) {
        if let Some(value) = self.pending.take() {
            self.history.push(value);
        }
    }
}

/// Keeps a [`History`] in step with an [`Instance`].
///
/// User changes are pushed, an application `replace` rewrites the current
/// slot, and values restored by undo/redo come back tagged as history actions
/// so they are never recorded a second time.
#[derive(Debug)]
pub struct HistoryBridge {
    state: Rc<RefCell<BridgeState>>,
    clock: Rc<dyn Clock>,
    listener: ListenerId,
}

impl HistoryBridge {
    pub fn attach(instance: &mut Instance, options: HistoryOptions) -> Result<Self, FormError> {
        let history = History::new(instance.value().clone(), options.capacity)?;
        let state = Rc::new(RefCell::new(BridgeState {
            history,
            pending: Debouncer::new(options.debounce),
        }));
        let clock = instance.clock();
        let listener = {
            let state = Rc::clone(&state);
            let clock = Rc::clone(&clock);
            instance.on_change(move |payload, meta| {
                if meta.silent || meta.action.is_history() {
                    return;
                }
                let mut state = state.borrow_mut();
                if meta.action == ChangeAction::Replace {
                    state.flush_pending();
                    state.history.replace_current(payload.value.clone());
                    return;
                }
                if state.pending.delay().is_zero() {
                    state.history.push(payload.value.clone());
                } else {
                    state.pending.schedule_at(payload.value.clone(), clock.now());
                }
            })
        };
        Ok(Self {
            state,
            clock,
            listener,
        })
    }

    /// Records a debounced snapshot once its window has elapsed.
    pub fn poll(&self) -> bool {
        let mut state = self.state.borrow_mut();
        match state.pending.take_due(self.clock.now()) {
            Some(value) => state.history.push(value),
            None => false,
        }
    }

    pub fn undo(&self, instance: &mut Instance) -> bool {
        // a user change still inside the store's debounce window must land first
        instance.flush();
        let restored = {
            let mut state = self.state.borrow_mut();
            state.flush_pending();
            state.history.undo()
        };
        self.apply(instance, HistoryKind::Undo, restored)
    }

    pub fn redo(&self, instance: &mut Instance) -> bool {
        instance.flush();
        let restored = {
            let mut state = self.state.borrow_mut();
            state.flush_pending();
            state.history.redo()
        };
        self.apply(instance, HistoryKind::Redo, restored)
    }

    /// Drops the undo/redo stack and re-seeds it with the instance's value.
    pub fn clear(&self, instance: &mut Instance) {
        let value = instance.value().clone();
        {
            let mut state = self.state.borrow_mut();
            state.pending.cancel();
            state.history.replace_current(value.clone());
            state.history.clear();
        }
        instance.history_action(HistoryKind::Replace, value, true);
    }

    pub fn can_undo(&self) -> bool {
        let state = self.state.borrow();
        state.pending.is_pending() || state.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        let state = self.state.borrow();
        !state.pending.is_pending() && state.history.can_redo()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().history.is_empty()
    }

    pub fn current(&self) -> FormValue {
        self.state.borrow().history.current().clone()
    }

    pub fn detach(self, instance: &mut Instance) {
        instance.unsubscribe(self.listener);
    }

    fn apply(&self, instance: &mut Instance, kind: HistoryKind, restored: Option<FormValue>) -> bool {
        let Some(value) = restored else {
            return false;
        };
        debug!(form = %instance.id(), ?kind, "restoring history snapshot");
        instance.history_action(kind, value, false);
        true
    }
}
