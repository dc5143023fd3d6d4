use std::fmt;

use serde::Serialize;

/// Tag carried by every change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    Set,
    Patch,
    Replace,
    Clear,
    Init,
    HistoryUndo,
    HistoryRedo,
    HistoryReplace,
}

impl ChangeAction {
    /// Actions applied by the history collaborator itself.
    pub fn is_history(self) -> bool {
        matches!(
            self,
            ChangeAction::HistoryUndo | ChangeAction::HistoryRedo | ChangeAction::HistoryReplace
        )
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeAction::Set => "SET",
            ChangeAction::Patch => "PATCH",
            ChangeAction::Replace => "REPLACE",
            ChangeAction::Clear => "CLEAR",
            ChangeAction::Init => "INIT",
            ChangeAction::HistoryUndo => "HISTORY_UNDO",
            ChangeAction::HistoryRedo => "HISTORY_REDO",
            ChangeAction::HistoryReplace => "HISTORY_REPLACE",
        };
        f.write_str(label)
    }
}

/// Kind of history operation passed to `Instance::history_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Undo,
    Redo,
    Replace,
}

impl From<HistoryKind> for ChangeAction {
    fn from(kind: HistoryKind) -> Self {
        match kind {
            HistoryKind::Undo => ChangeAction::HistoryUndo,
            HistoryKind::Redo => ChangeAction::HistoryRedo,
            HistoryKind::Replace => ChangeAction::HistoryReplace,
        }
    }
}

/// Second argument of every listener call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeMeta {
    pub action: ChangeAction,
    pub silent: bool,
}
