use std::{fmt, rc::Rc};

use super::instance::Instance;

/// A live binding that may hold a write the store has not seen yet.
///
/// `Instance::request_immediate_value` calls every registered item so pending
/// keystrokes land in the store before a submit snapshot is taken.
pub trait ReportImmediate {
    fn report_form_immediate(&self, instance: &mut Instance);
}

impl<F> ReportImmediate for F
where
    F: Fn(&mut Instance),
{
    fn report_form_immediate(&self, instance: &mut Instance) {
        self(instance)
    }
}

#[derive(Clone)]
pub struct RegisteredItem {
    pub id: String,
    pub item: Rc<dyn ReportImmediate>,
}

impl RegisteredItem {
    pub fn new(id: impl Into<String>, item: Rc<dyn ReportImmediate>) -> Self {
        Self {
            id: id.into(),
            item,
        }
    }
}

impl fmt::Debug for RegisteredItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredItem")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
