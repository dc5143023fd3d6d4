use std::{
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::Rc,
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::{
    actions::{ChangeAction, ChangeMeta, HistoryKind},
    options::{IdGenerator, InstanceOptions},
    payload::Payload,
    registry::{RegisteredItem, ReportImmediate},
    required::RequiredErrors,
    schedule::{Clock, Debouncer},
};
use crate::{
    path::{Path, get_in, merge_shallow, set_in, unset_in},
    value::FormValue,
};

type Listener = Box<dyn FnMut(&Payload, ChangeMeta)>;
type ReadCache = RefCell<HashMap<Path, Option<FormValue>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Path-addressed value and error store for one logical form.
///
/// Every write is applied synchronously and in order; reads right after a
/// write already see it. Listener delivery is debounced: a burst of writes
/// produces a single notification carrying the final state and the meta of
/// the last write. Call [`Instance::poll`] from the event loop (or
/// [`Instance::flush`]) to deliver.
pub struct Instance {
    id: String,
    value: FormValue,
    errors: FormValue,
    required: RequiredErrors,
    changes_count: u64,
    last_change: Option<Instant>,
    last_submit: Option<Instant>,
    value_cache: ReadCache,
    error_cache: ReadCache,
    listeners: IndexMap<ListenerId, Listener>,
    next_listener: u64,
    notify: Debouncer<ChangeMeta>,
    items: IndexMap<String, Rc<dyn ReportImmediate>>,
    clock: Rc<dyn Clock>,
    ids: IdGenerator,
}

impl Default for Instance {
    fn default() -> Self {
        Self::new(FormValue::object())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("value", &self.value)
            .field("errors", &self.errors)
            .field("required", &self.required)
            .field("changes_count", &self.changes_count)
            .field("listeners", &self.listeners.len())
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl Instance {
    pub fn new(value: impl Into<FormValue>) -> Self {
        Self::with_options(value, InstanceOptions::default())
    }

    pub fn with_options(value: impl Into<FormValue>, options: InstanceOptions) -> Self {
        let InstanceOptions {
            debounce,
            clock,
            ids,
        } = options;
        let value = match value.into() {
            FormValue::Null => FormValue::object(),
            other => other,
        };
        Self {
            id: ids.prefix().to_string(),
            value,
            errors: FormValue::object(),
            required: RequiredErrors::new(),
            changes_count: 0,
            last_change: None,
            last_submit: None,
            value_cache: RefCell::default(),
            error_cache: RefCell::default(),
            listeners: IndexMap::new(),
            next_listener: 0,
            notify: Debouncer::new(debounce),
            items: IndexMap::new(),
            clock,
            ids,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn next_id(&mut self) -> String {
        self.ids.next_id()
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    pub fn value(&self) -> &FormValue {
        &self.value
    }

    pub fn errors(&self) -> &FormValue {
        &self.errors
    }

    pub fn required_errors(&self) -> &RequiredErrors {
        &self.required
    }

    pub fn errors_count(&self) -> usize {
        self.errors.count_messages()
    }

    pub fn changes_count(&self) -> u64 {
        self.changes_count
    }

    pub fn last_change(&self) -> Option<Instant> {
        self.last_change
    }

    pub fn last_submit(&self) -> Option<Instant> {
        self.last_submit
    }

    /// True iff the last change happened after the last submit.
    pub fn changed(&self) -> bool {
        match (self.last_change, self.last_submit) {
            (Some(change), Some(submit)) => change > submit,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn payload(&self) -> Payload {
        Payload {
            id: self.id.clone(),
            value: self.value.clone(),
            errors: self.errors.clone(),
            errors_count: self.errors_count(),
            changes_count: self.changes_count,
            changed: self.changed(),
            last_change: self.last_change,
            last_submit: self.last_submit,
        }
    }

    /// Value at `path`, or `Null` when absent. The root path yields the whole value.
    pub fn get(&self, path: impl Into<Path>) -> FormValue {
        self.lookup(&path.into()).unwrap_or_default()
    }

    pub fn get_or(&self, path: impl Into<Path>, default: impl Into<FormValue>) -> FormValue {
        self.lookup(&path.into()).unwrap_or_else(|| default.into())
    }

    pub fn lookup(&self, path: &Path) -> Option<FormValue> {
        cached_read(&self.value_cache, &self.value, path)
    }

    /// Error at `path`. Slots nulled by an unset inside an error list read as absent.
    pub fn get_error(&self, path: impl Into<Path>) -> Option<FormValue> {
        cached_read(&self.error_cache, &self.errors, &path.into()).filter(|error| !error.is_null())
    }

    pub fn has_required_error(&self, path: impl Into<Path>) -> bool {
        self.required.contains(&path.into())
    }

    pub fn set(
        &mut self,
        path: impl Into<Path>,
        value: impl Into<FormValue>,
        silent: bool,
    ) -> FormValue {
        let path = path.into();
        if path.is_empty() {
            warn!(form = %self.id, "ignoring set on the root path; use replace");
            return self.value.clone();
        }
        self.value = set_in(&self.value, &path, value.into());
        debug!(form = %self.id, path = %path, silent, "value set");
        self.touch(ChangeAction::Set, silent);
        self.value.clone()
    }

    /// Writes an error at `path`, replacing whatever error subtree was there
    /// along with the required flags nested under it.
    ///
    /// An empty-string message is not an error and leaves the store untouched.
    /// A null message is treated the same way: writing it would leave a null
    /// leaf in `errors`, which must never hold empty residue.
    pub fn set_error(
        &mut self,
        path: impl Into<Path>,
        message: impl Into<FormValue>,
        silent: bool,
        is_required: bool,
    ) -> FormValue {
        let path = path.into();
        let message = message.into();
        if message.is_null() || message.as_str() == Some("") {
            return self.errors.clone();
        }
        if path.is_empty() {
            warn!(form = %self.id, "ignoring error on the root path");
            return self.errors.clone();
        }
        self.errors = set_in(&self.errors, &path, message);
        self.required.remove_prefixed(&path);
        if is_required {
            self.required.insert(&path);
        }
        debug!(form = %self.id, path = %path, is_required, "error set");
        self.touch(ChangeAction::Set, silent);
        self.errors.clone()
    }

    /// Removes the error subtree at `path` along with any ancestors left empty,
    /// and drops the matching required flags. Unsetting an absent path is a no-op.
    pub fn unset_error(&mut self, path: impl Into<Path>, silent: bool) -> FormValue {
        let path = path.into();
        if path.is_empty() {
            return self.clear_errors(silent);
        }
        self.required.remove_prefixed(&path);
        if let Some(next) = unset_in(&self.errors, &path) {
            self.errors = next;
            debug!(form = %self.id, path = %path, "error unset");
            self.touch(ChangeAction::Set, silent);
        }
        self.errors.clone()
    }

    pub fn clear_errors(&mut self, silent: bool) -> FormValue {
        self.errors = FormValue::object();
        self.required.clear();
        self.touch(ChangeAction::Clear, silent);
        self.errors.clone()
    }

    pub fn clear(&mut self, silent: bool) -> FormValue {
        self.value = FormValue::object();
        self.errors = FormValue::object();
        self.required.clear();
        debug!(form = %self.id, "cleared");
        self.touch(ChangeAction::Clear, silent);
        self.value.clone()
    }

    pub fn replace(&mut self, value: impl Into<FormValue>, silent: bool) -> FormValue {
        self.value = value.into();
        debug!(form = %self.id, silent, "value replaced");
        self.touch(ChangeAction::Replace, silent);
        self.value.clone()
    }

    /// Shallow merge of `values` into the root object.
    pub fn patch(&mut self, values: impl Into<FormValue>, silent: bool) -> FormValue {
        self.value = merge_shallow(&self.value, &values.into());
        self.touch(ChangeAction::Patch, silent);
        self.value.clone()
    }

    /// Seeds the value once. Returns false when a non-empty value already exists.
    pub fn init(&mut self, value: impl Into<FormValue>, silent: bool) -> bool {
        if !(self.value.is_null() || self.value.is_empty_container()) {
            return false;
        }
        self.value = value.into();
        self.touch(ChangeAction::Init, silent);
        true
    }

    pub fn update<F>(&mut self, path: impl Into<Path>, f: F, silent: bool) -> FormValue
    where
        F: FnOnce(&FormValue) -> FormValue,
    {
        let path = path.into();
        let next = f(&self.get(&path));
        self.set(path, next, silent)
    }

    /// Applies a value coming from the history collaborator. The change is
    /// tagged so the collaborator does not record it again.
    pub fn history_action(
        &mut self,
        kind: HistoryKind,
        value: impl Into<FormValue>,
        silent: bool,
    ) -> FormValue {
        self.value = value.into();
        let action = ChangeAction::from(kind);
        debug!(form = %self.id, %action, "history applied");
        self.touch(action, silent);
        self.value.clone()
    }

    /// Flushes registered bindings, stamps the submit time and returns the
    /// resulting snapshot. Validation failures show up as `errors_count > 0`.
    pub fn submit(&mut self) -> Payload {
        self.request_immediate_value();
        self.last_submit = Some(self.clock.now());
        self.payload()
    }

    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&Payload, ChangeMeta) + 'static,
    {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, Box::new(listener));
        id
    }

    /// Returns false when the listener was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.shift_remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn register_item(&mut self, item: RegisteredItem) {
        trace!(form = %self.id, item = %item.id, "item registered");
        self.items.insert(item.id, item.item);
    }

    pub fn unregister_item(&mut self, id: &str) -> bool {
        self.items.shift_remove(id).is_some()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Synchronously asks every registered binding to push its pending write.
    pub fn request_immediate_value(&mut self) {
        let items: Vec<_> = self.items.values().cloned().collect();
        for item in items {
            item.report_form_immediate(self);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.notify.next_deadline()
    }

    pub fn debounce(&self) -> Duration {
        self.notify.delay()
    }

    pub fn has_pending_notification(&self) -> bool {
        self.notify.is_pending()
    }

    /// Delivers the pending notification if its debounce window has elapsed.
    pub fn poll(&mut self) -> bool {
        match self.notify.take_due(self.clock.now()) {
            Some(meta) => {
                self.deliver(meta);
                true
            }
            None => false,
        }
    }

    /// Delivers the pending notification now, if any.
    pub fn flush(&mut self) -> bool {
        match self.notify.take() {
            Some(meta) => {
                self.deliver(meta);
                true
            }
            None => false,
        }
    }

    fn touch(&mut self, action: ChangeAction, silent: bool) {
        let now = self.clock.now();
        self.last_change = Some(now);
        self.changes_count += 1;
        self.value_cache.borrow_mut().clear();
        self.error_cache.borrow_mut().clear();
        self.notify.schedule_at(ChangeMeta { action, silent }, now);
    }

    fn deliver(&mut self, meta: ChangeMeta) {
        let payload = self.payload();
        debug!(
            form = %self.id,
            action = %meta.action,
            silent = meta.silent,
            listeners = self.listeners.len(),
            "notifying listeners"
        );
        for listener in self.listeners.values_mut() {
            listener(&payload, meta);
        }
    }
}

fn cached_read(cache: &ReadCache, source: &FormValue, path: &Path) -> Option<FormValue> {
    if path.is_empty() {
        return Some(source.clone());
    }
    if let Some(hit) = cache.borrow().get(path) {
        trace!(path = %path, "read cache hit");
        return hit.clone();
    }
    let found = get_in(source, path).cloned();
    cache.borrow_mut().insert(path.clone(), found.clone());
    found
}
