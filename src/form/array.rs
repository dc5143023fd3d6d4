use tracing::debug;

use super::{error::FormError, instance::Instance, options::ListOptions};
use crate::{
    path::{Path, get_in, merge_shallow},
    value::FormValue,
};

/// Structural operations for the list stored at one path.
///
/// The controller never holds list data; it reads and writes through the
/// [`Instance`]. What it owns is the key table: one stable id per array slot,
/// minted lazily and carried along by add/remove/move so that a row keeps its
/// identity while its index changes.
#[derive(Debug, Clone)]
pub struct ListController {
    path: Path,
    options: ListOptions,
    keys: Vec<Option<u64>>,
    next_key: u64,
}

impl ListController {
    pub fn new(path: impl Into<Path>, options: ListOptions) -> Result<Self, FormError> {
        let path = path.into();
        if path.is_empty() {
            return Err(FormError::EmptyPath { what: "list" });
        }
        options.validate()?;
        Ok(Self {
            path,
            options,
            keys: Vec::new(),
            next_key: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> ListOptions {
        self.options
    }

    pub fn size(&self, instance: &Instance) -> usize {
        instance
            .lookup(&self.path)
            .and_then(|value| value.as_array().map(<[FormValue]>::len))
            .unwrap_or(0)
    }

    pub fn can_add(&self, instance: &Instance) -> bool {
        self.options
            .max
            .is_none_or(|max| self.size(instance) < max)
    }

    pub fn can_remove(&self, instance: &Instance) -> bool {
        self.size(instance) > self.options.min
    }

    /// Stable id of the item currently at `index`, minted on first sight.
    pub fn get_key(&mut self, index: usize) -> u64 {
        self.reserve(index + 1);
        match self.keys[index] {
            Some(key) => key,
            None => {
                let key = self.mint();
                self.keys[index] = Some(key);
                key
            }
        }
    }

    /// Keys for every current index, in order.
    pub fn keys(&mut self, instance: &Instance) -> Vec<u64> {
        (0..self.size(instance)).map(|idx| self.get_key(idx)).collect()
    }

    /// Inserts `value` at `index` (append when `None` or past the end) and
    /// returns the new item's key. Returns 0 for a falsy value or a full list.
    pub fn add(
        &mut self,
        instance: &mut Instance,
        value: impl Into<FormValue>,
        index: Option<usize>,
    ) -> u64 {
        let value = value.into();
        if !value.is_truthy() {
            debug!(list = %self.path, "ignoring add of a falsy value");
            return 0;
        }
        if !self.can_add(instance) {
            debug!(list = %self.path, max = ?self.options.max, "list is full");
            return 0;
        }
        self.insert_at(instance, value, index)
    }

    /// Removes the item at `index` along with its errors and required flags.
    pub fn remove(&mut self, instance: &mut Instance, index: usize) -> bool {
        if index >= self.size(instance) {
            debug!(list = %self.path, index, "ignoring remove out of range");
            return false;
        }
        if !self.can_remove(instance) {
            debug!(list = %self.path, min = self.options.min, "list is at its minimum");
            return false;
        }
        let mut items = self.items(instance);
        items.remove(index);
        instance.set(self.path.clone(), FormValue::from_items(items), false);
        instance.unset_error(self.path.child(index), false);
        if index < self.keys.len() {
            self.keys.remove(index);
        }
        true
    }

    /// Moves the item at `from` to `to`, shifting the items in between by one
    /// slot. Keys follow every item. Errors are only exchanged between the two
    /// endpoints; items that merely shift keep their slot's errors.
    pub fn move_item(&mut self, instance: &mut Instance, from: usize, to: usize) -> bool {
        let size = self.size(instance);
        if from == to || from >= size || to >= size {
            return false;
        }
        let mut items = self.items(instance);
        let item = items.remove(from);
        items.insert(to, item);

        self.reserve(from.max(to) + 1);
        let key = self.keys.remove(from);
        self.keys.insert(to, key);

        instance.set(self.path.clone(), FormValue::from_items(items), false);
        self.swap_endpoint_errors(instance, from, to);
        true
    }

    /// Inserts a shallow copy of the item at `index` right after it. A source
    /// that is not an object is duplicated as an empty object.
    pub fn duplicate(
        &mut self,
        instance: &mut Instance,
        index: usize,
        patch: Option<FormValue>,
    ) -> u64 {
        let items = self.items(instance);
        let Some(source) = items.get(index) else {
            return 0;
        };
        let base = if source.is_object() {
            source.clone()
        } else {
            FormValue::object()
        };
        let copy = match patch {
            Some(patch) if patch.is_object() => merge_shallow(&base, &patch),
            _ => base,
        };
        self.add(instance, copy, Some(index + 1))
    }

    pub fn move_up(&mut self, instance: &mut Instance, index: usize) -> Option<usize> {
        self.move_up_visible(instance, index, |_, _| true)
    }

    pub fn move_down(&mut self, instance: &mut Instance, index: usize) -> Option<usize> {
        self.move_down_visible(instance, index, |_, _| true)
    }

    /// Moves towards the front, skipping items rejected by `visible`.
    /// Returns the new index.
    pub fn move_up_visible<F>(
        &mut self,
        instance: &mut Instance,
        index: usize,
        visible: F,
    ) -> Option<usize>
    where
        F: Fn(&FormValue, usize) -> bool,
    {
        let items = self.items(instance);
        if index == 0 || index >= items.len() {
            return None;
        }
        let target = (0..index).rev().find(|&idx| visible(&items[idx], idx))?;
        self.move_item(instance, index, target).then_some(target)
    }

    pub fn move_down_visible<F>(
        &mut self,
        instance: &mut Instance,
        index: usize,
        visible: F,
    ) -> Option<usize>
    where
        F: Fn(&FormValue, usize) -> bool,
    {
        let items = self.items(instance);
        if index + 1 >= items.len() {
            return None;
        }
        let target = (index + 1..items.len()).find(|&idx| visible(&items[idx], idx))?;
        self.move_item(instance, index, target).then_some(target)
    }

    /// Drops the key table. Keys minted afterwards never repeat earlier ones.
    pub fn unmount(&mut self) {
        self.keys.clear();
    }

    fn insert_at(&mut self, instance: &mut Instance, value: FormValue, index: Option<usize>) -> u64 {
        let mut items = self.items(instance);
        let at = index
            .filter(|idx| *idx <= items.len())
            .unwrap_or(items.len());
        items.insert(at, value);
        self.reserve(at);
        let key = self.mint();
        self.keys.insert(at, Some(key));
        instance.set(self.path.clone(), FormValue::from_items(items), false);
        key
    }

    fn swap_endpoint_errors(&self, instance: &mut Instance, from: usize, to: usize) {
        let from_path = self.path.child(from);
        let to_path = self.path.child(to);
        let from_error = instance.get_error(&from_path);
        let to_error = instance.get_error(&to_path);
        if from_error.is_none() && to_error.is_none() {
            return;
        }
        let from_flags = instance.required_errors().suffixes_under(&from_path);
        let to_flags = instance.required_errors().suffixes_under(&to_path);
        instance.unset_error(&from_path, false);
        instance.unset_error(&to_path, false);
        if let Some(error) = from_error {
            restore_error(instance, &to_path, error, &from_flags);
        }
        if let Some(error) = to_error {
            restore_error(instance, &from_path, error, &to_flags);
        }
    }

    fn items(&self, instance: &Instance) -> Vec<FormValue> {
        instance
            .lookup(&self.path)
            .and_then(|value| value.as_array().map(<[FormValue]>::to_vec))
            .unwrap_or_default()
    }

    fn reserve(&mut self, len: usize) {
        if self.keys.len() < len {
            self.keys.resize(len, None);
        }
    }

    fn mint(&mut self) -> u64 {
        self.next_key += 1;
        self.next_key
    }
}

fn restore_error(instance: &mut Instance, at: &Path, error: FormValue, flags: &[Path]) {
    let whole_required = flags.iter().any(Path::is_empty);
    instance.set_error(at, error.clone(), false, whole_required);
    for suffix in flags.iter().filter(|suffix| !suffix.is_empty()) {
        let Some(message) = get_in(&error, suffix) else {
            continue;
        };
        let mut nested = at.clone();
        for segment in suffix.segments() {
            nested = nested.child(segment.clone());
        }
        instance.set_error(nested, message.clone(), false, true);
    }
}
