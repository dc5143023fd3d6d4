mod actions;
mod array;
mod error;
mod field;
mod history;
mod instance;
mod options;
mod payload;
mod registry;
mod required;
mod schedule;

pub use actions::{ChangeAction, ChangeMeta, HistoryKind};
pub use array::ListController;
pub use error::FormError;
pub use field::{
    EffectArgs, Field, FieldOptions, HookArgs, PathError, REQUIRED_MESSAGE, Required,
    RequiredOutcome,
};
pub use history::{History, HistoryBridge};
pub use instance::{Instance, ListenerId};
pub use options::{
    DEFAULT_HISTORY_CAPACITY, HistoryOptions, IdGenerator, InstanceOptions, ListOptions,
};
pub use payload::Payload;
pub use registry::{RegisteredItem, ReportImmediate};
pub use required::RequiredErrors;
pub use schedule::{Clock, DEFAULT_NOTIFY_DEBOUNCE, Debouncer, ManualClock, SystemClock};
