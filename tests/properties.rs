use std::collections::BTreeSet;

use formstore::{FormValue, Instance, Path, PathSegment};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = PathSegment> {
    prop_oneof![
        "[a-c]".prop_map(PathSegment::Key),
        (0usize..3).prop_map(PathSegment::Index),
    ]
}

fn any_path() -> impl Strategy<Value = Path> {
    prop::collection::vec(segment(), 1..4).prop_map(Path::from)
}

/// Depth-two key paths never prefix one another, so each one is its own leaf.
fn leaf_paths() -> impl Strategy<Value = BTreeSet<(String, String)>> {
    prop::collection::btree_set(("[a-c]", "[x-z]"), 0..9)
}

fn leaf(pair: &(String, String)) -> Path {
    Path::from_iter([pair.0.as_str(), pair.1.as_str()])
}

fn has_hollow_descendant(node: &FormValue) -> bool {
    let children: Vec<&FormValue> = match node {
        FormValue::Array(items) => items.iter().collect(),
        FormValue::Object(map) => map.values().collect(),
        _ => return false,
    };
    children.into_iter().any(|child| {
        (child.is_array() || child.is_object()) && child.is_hollow()
            || has_hollow_descendant(child)
    })
}

proptest! {
    #[test]
    fn get_after_set_returns_the_written_value(path in any_path(), n in any::<i64>()) {
        let mut form = Instance::new(FormValue::object());
        form.set(path.clone(), n, false);
        prop_assert_eq!(form.get(path), FormValue::from(n));
    }

    #[test]
    fn last_write_wins_across_overlapping_paths(
        writes in prop::collection::vec((any_path(), any::<i64>()), 1..8),
    ) {
        let mut form = Instance::new(FormValue::object());
        for (path, n) in &writes {
            form.set(path.clone(), *n, false);
        }
        let (path, n) = writes.last().unwrap();
        prop_assert_eq!(form.get(path.clone()), FormValue::from(*n));
    }

    #[test]
    fn unset_error_is_idempotent(
        errors in prop::collection::vec(any_path(), 0..6),
        target in any_path(),
    ) {
        let mut form = Instance::new(FormValue::object());
        for path in &errors {
            form.set_error(path.clone(), "bad", false, true);
        }
        let once = form.unset_error(target.clone(), false);
        let required = form.required_errors().clone();
        let twice = form.unset_error(target, false);
        prop_assert_eq!(once, twice);
        prop_assert_eq!(&required, form.required_errors());
    }

    #[test]
    fn unset_never_leaves_hollow_containers(
        errors in prop::collection::vec(any_path(), 0..8),
        removals in prop::collection::vec(any_path(), 0..8),
    ) {
        let mut form = Instance::new(FormValue::object());
        for path in &errors {
            form.set_error(path.clone(), "bad", false, false);
        }
        for path in &removals {
            form.unset_error(path.clone(), false);
            prop_assert!(!has_hollow_descendant(form.errors()));
        }
    }

    #[test]
    fn errors_count_tracks_leaf_messages(
        leaves in leaf_paths(),
        drop_mask in prop::collection::vec(any::<bool>(), 9),
    ) {
        let mut form = Instance::new(FormValue::object());
        for pair in &leaves {
            form.set_error(leaf(pair), "bad", false, false);
        }
        prop_assert_eq!(form.errors_count(), leaves.len());

        let mut remaining = leaves.len();
        for (pair, drop) in leaves.iter().zip(&drop_mask) {
            if *drop {
                form.unset_error(leaf(pair), false);
                remaining -= 1;
            }
        }
        prop_assert_eq!(form.errors_count(), remaining);
        prop_assert!(!has_hollow_descendant(form.errors()));
        if remaining == 0 {
            prop_assert_eq!(form.errors(), &FormValue::object());
        }
    }
}
