#![deny(rust_2018_idioms)]

//! Path-addressed reactive value/error store for nested forms.
//!
//! An [`Instance`] owns the form value, its errors and the set of required
//! errors. Writes apply immediately; listeners are notified once per debounce
//! window. [`ListController`] keeps stable row keys and errors attached to
//! their items through insert/remove/move, and [`HistoryBridge`] wires an
//! undo/redo stack to the store without feedback loops.

pub mod form;
pub mod io;
pub mod path;
mod value;

pub use form::{
    ChangeAction, ChangeMeta, Field, FieldOptions, FormError, History, HistoryBridge,
    HistoryKind, HistoryOptions, Instance, InstanceOptions, ListController, ListOptions, Payload,
};
pub use path::{Path, PathSegment};
pub use value::{FormMap, FormValue};

pub mod prelude {
    pub use super::{
        ChangeAction, Field, FieldOptions, FormValue, HistoryBridge, Instance, ListController,
        ListOptions, Path, path,
    };
}
