use std::sync::Arc;

use super::{Path, PathSegment};
use crate::value::{FormMap, FormValue};

pub fn get_in<'a>(root: &'a FormValue, path: &Path) -> Option<&'a FormValue> {
    let mut current = root;
    for segment in path.segments() {
        current = child(current, segment)?;
    }
    Some(current)
}

fn child<'a>(node: &'a FormValue, segment: &PathSegment) -> Option<&'a FormValue> {
    match node {
        FormValue::Object(map) => map.get(&segment.to_string()),
        FormValue::Array(items) => items.get(segment.as_index()?),
        _ => None,
    }
}

/// Returns a copy of `root` with `value` written at `path`.
///
/// Only the containers along the path are copied; siblings keep their
/// allocation. Missing or scalar intermediates are replaced by an array for
/// an index segment and an object for a key segment. An index segment on an
/// existing object writes the key of the same spelling, as [`get_in`] reads it.
pub fn set_in(root: &FormValue, path: &Path, value: FormValue) -> FormValue {
    let mut next = root.clone();
    write_at(&mut next, path.segments(), value);
    next
}

fn write_at(node: &mut FormValue, segments: &[PathSegment], value: FormValue) {
    let Some((segment, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    let slot = slot_mut(node, segment);
    write_at(slot, rest, value);
}

fn slot_mut<'a>(node: &'a mut FormValue, segment: &PathSegment) -> &'a mut FormValue {
    match segment {
        // an index into an existing object addresses the key of the same spelling
        PathSegment::Index(idx) if node.is_object() => key_slot(node, idx.to_string()),
        PathSegment::Index(idx) => index_slot(node, *idx),
        PathSegment::Key(key) => {
            // numeric keys address an existing array positionally
            let array_idx = match node {
                FormValue::Array(_) => key.parse::<usize>().ok(),
                _ => None,
            };
            match array_idx {
                Some(idx) => index_slot(node, idx),
                None => key_slot(node, key.clone()),
            }
        }
    }
}

fn key_slot(node: &mut FormValue, key: String) -> &mut FormValue {
    if !node.is_object() {
        *node = FormValue::object();
    }
    let FormValue::Object(map) = node else {
        unreachable!("node was just made an object");
    };
    Arc::make_mut(map).entry(key).or_insert(FormValue::Null)
}

fn index_slot(node: &mut FormValue, idx: usize) -> &mut FormValue {
    if !node.is_array() {
        *node = FormValue::array();
    }
    let FormValue::Array(items) = node else {
        unreachable!("node was just made an array");
    };
    let items = Arc::make_mut(items);
    if items.len() <= idx {
        items.resize(idx + 1, FormValue::Null);
    }
    &mut items[idx]
}

/// Removes the entry at `path` and prunes every ancestor left hollow, stopping
/// below the root. Array slots are nulled rather than spliced so sibling
/// indices hold. Returns `None` when nothing was at `path`.
pub fn unset_in(root: &FormValue, path: &Path) -> Option<FormValue> {
    if path.is_empty() || get_in(root, path).is_none() {
        return None;
    }
    let mut next = root.clone();
    remove_at(&mut next, path.segments());
    Some(next)
}

fn remove_at(node: &mut FormValue, segments: &[PathSegment]) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        detach(node, segment);
        return;
    }
    let hollow = match node {
        FormValue::Object(map) => {
            let key = segment.to_string();
            if !map.contains_key(&key) {
                return;
            }
            let map = Arc::make_mut(map);
            let Some(child) = map.get_mut(&key) else {
                return;
            };
            remove_at(child, rest);
            child.is_hollow()
        }
        FormValue::Array(items) => {
            let Some(idx) = segment.as_index().filter(|idx| *idx < items.len()) else {
                return;
            };
            let child = &mut Arc::make_mut(items)[idx];
            remove_at(child, rest);
            child.is_hollow()
        }
        _ => return,
    };
    if hollow {
        detach(node, segment);
    }
}

fn detach(node: &mut FormValue, segment: &PathSegment) {
    match node {
        FormValue::Object(map) => {
            let key = segment.to_string();
            if map.contains_key(&key) {
                Arc::make_mut(map).shift_remove(&key);
            }
        }
        FormValue::Array(items) => {
            if let Some(idx) = segment.as_index().filter(|idx| *idx < items.len()) {
                Arc::make_mut(items)[idx] = FormValue::Null;
            }
        }
        _ => {}
    }
}

/// Top-level shallow merge. Non-object operands yield `patch` unchanged.
pub fn merge_shallow(base: &FormValue, patch: &FormValue) -> FormValue {
    match (base, patch) {
        (FormValue::Object(base), FormValue::Object(patch)) => {
            let mut merged: FormMap = (**base).clone();
            for (key, value) in patch.iter() {
                merged.insert(key.clone(), value.clone());
            }
            FormValue::from_map(merged)
        }
        (_, patch) => patch.clone(),
    }
}
