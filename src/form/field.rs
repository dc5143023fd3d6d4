use std::{cell::RefCell, fmt, rc::Rc, time::Duration};

use tracing::debug;

use super::{
    error::FormError,
    instance::Instance,
    registry::{RegisteredItem, ReportImmediate},
    schedule::{Clock, Debouncer},
};
use crate::{path::Path, value::FormValue};

pub const REQUIRED_MESSAGE: &str = "Required Field.";

/// Arguments handed to transforms and required checks.
pub struct HookArgs<'a> {
    pub instance: &'a Instance,
    pub path: &'a Path,
    pub prev_value: &'a FormValue,
    pub value: &'a FormValue,
}

/// Arguments handed to a field effect, which may write back into the store.
pub struct EffectArgs<'a> {
    pub instance: &'a mut Instance,
    pub path: &'a Path,
    pub prev_value: &'a FormValue,
    pub value: &'a FormValue,
}

pub type Transform = Rc<dyn Fn(&HookArgs<'_>) -> FormValue>;
pub type Effect = Rc<dyn Fn(EffectArgs<'_>)>;
pub type RequiredCheck = Rc<dyn Fn(&HookArgs<'_>) -> RequiredOutcome>;

#[derive(Debug, Clone, PartialEq)]
pub struct PathError {
    pub path: Path,
    pub error: String,
}

impl PathError {
    pub fn new(path: impl Into<Path>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            error: error.into(),
        }
    }
}

/// Result of a custom required check.
#[derive(Debug, Clone, PartialEq)]
pub enum RequiredOutcome {
    Pass,
    Message(String),
    Errors(Vec<PathError>),
}

impl From<PathError> for RequiredOutcome {
    fn from(error: PathError) -> Self {
        RequiredOutcome::Errors(vec![error])
    }
}

#[derive(Clone, Default)]
pub enum Required {
    #[default]
    Off,
    On,
    Check(RequiredCheck),
}

impl From<bool> for Required {
    fn from(flag: bool) -> Self {
        if flag { Required::On } else { Required::Off }
    }
}

impl fmt::Debug for Required {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Required::Off => f.write_str("Off"),
            Required::On => f.write_str("On"),
            Required::Check(_) => f.write_str("Check(..)"),
        }
    }
}

#[derive(Clone)]
pub struct FieldOptions {
    pub default: Option<FormValue>,
    pub debounce: Duration,
    pub required: Required,
    pub empty: FormValue,
    pub transform_in: Option<Transform>,
    pub transform_out: Option<Transform>,
    pub child_transform: Option<Transform>,
    pub effect: Option<Effect>,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            default: None,
            debounce: Duration::ZERO,
            required: Required::Off,
            empty: FormValue::from(""),
            transform_in: None,
            transform_out: None,
            child_transform: None,
            effect: None,
        }
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("default", &self.default)
            .field("debounce", &self.debounce)
            .field("required", &self.required)
            .field("empty", &self.empty)
            .field("transform_in", &self.transform_in.is_some())
            .field("transform_out", &self.transform_out.is_some())
            .field("child_transform", &self.child_transform.is_some())
            .field("effect", &self.effect.is_some())
            .finish()
    }
}

impl FieldOptions {
    pub fn with_default(mut self, default: impl Into<FormValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_required(mut self, required: impl Into<Required>) -> Self {
        self.required = required.into();
        self
    }

    pub fn with_required_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&HookArgs<'_>) -> RequiredOutcome + 'static,
    {
        self.required = Required::Check(Rc::new(check));
        self
    }

    pub fn with_empty(mut self, empty: impl Into<FormValue>) -> Self {
        self.empty = empty.into();
        self
    }

    pub fn with_transform_in<F>(mut self, transform: F) -> Self
    where
        F: Fn(&HookArgs<'_>) -> FormValue + 'static,
    {
        self.transform_in = Some(Rc::new(transform));
        self
    }

    pub fn with_transform_out<F>(mut self, transform: F) -> Self
    where
        F: Fn(&HookArgs<'_>) -> FormValue + 'static,
    {
        self.transform_out = Some(Rc::new(transform));
        self
    }

    pub fn with_child_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&HookArgs<'_>) -> FormValue + 'static,
    {
        self.child_transform = Some(Rc::new(transform));
        self
    }

    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(EffectArgs<'_>) + 'static,
    {
        self.effect = Some(Rc::new(effect));
        self
    }
}

/// One mounted field binding.
///
/// Input is held locally and committed to the store after the field's own
/// debounce; at most one commit is pending at a time. The binding registers
/// itself on the instance so a submit can force the pending commit through.
pub struct Field {
    id: String,
    path: Path,
    options: FieldOptions,
    clock: Rc<dyn Clock>,
    pending: RefCell<Debouncer<FormValue>>,
    flagged: RefCell<Vec<Path>>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("options", &self.options)
            .field("pending", &self.pending.borrow().peek())
            .field("flagged", &self.flagged.borrow())
            .finish()
    }
}

impl Field {
    pub fn mount(
        instance: &mut Instance,
        path: impl Into<Path>,
        options: FieldOptions,
    ) -> Result<Rc<Field>, FormError> {
        let path = path.into();
        if path.is_empty() {
            return Err(FormError::EmptyPath { what: "field" });
        }
        if let Some(default) = &options.default
            && instance.lookup(&path).is_none()
        {
            instance.set(path.clone(), default.clone(), true);
        }
        let field = Rc::new(Field {
            id: instance.next_id(),
            pending: RefCell::new(Debouncer::new(options.debounce)),
            flagged: RefCell::default(),
            clock: instance.clock(),
            path,
            options,
        });
        instance.register_item(RegisteredItem::new(field.id.clone(), field.clone()));
        debug!(field = %field.id, path = %field.path, "field mounted");
        Ok(field)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value the binding shows: uncommitted input first, else the stored value
    /// passed through `transform_in`.
    pub fn value(&self, instance: &Instance) -> FormValue {
        if let Some(pending) = self.pending.borrow().peek() {
            return pending.clone();
        }
        let stored = self.stored(instance);
        match &self.options.transform_in {
            Some(transform) => transform(&HookArgs {
                instance,
                path: &self.path,
                prev_value: &stored,
                value: &stored,
            }),
            None => stored,
        }
    }

    /// [`Field::value`] passed through the display-only `child_transform`.
    pub fn display_value(&self, instance: &Instance) -> FormValue {
        let value = self.value(instance);
        match &self.options.child_transform {
            Some(transform) => transform(&HookArgs {
                instance,
                path: &self.path,
                prev_value: &value,
                value: &value,
            }),
            None => value,
        }
    }

    pub fn error(&self, instance: &Instance) -> Option<FormValue> {
        instance.get_error(&self.path)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.borrow().is_pending()
    }

    /// Takes a keystroke. Any pending commit is cancelled and rescheduled;
    /// with no debounce the value is committed at once.
    pub fn input(&self, instance: &mut Instance, value: impl Into<FormValue>) {
        let value = value.into();
        if self.options.debounce.is_zero() {
            self.pending.borrow_mut().cancel();
            self.commit_value(instance, value);
            return;
        }
        let mut pending = self.pending.borrow_mut();
        pending.cancel();
        pending.schedule_at(value, self.clock.now());
    }

    /// Commits the pending input if its debounce window has elapsed.
    pub fn poll(&self, instance: &mut Instance) -> bool {
        let due = self.pending.borrow_mut().take_due(self.clock.now());
        match due {
            Some(value) => {
                self.commit_value(instance, value);
                true
            }
            None => false,
        }
    }

    /// Commits the pending input now. Returns false when nothing was pending.
    pub fn commit(&self, instance: &mut Instance) -> bool {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(value) => {
                self.commit_value(instance, value);
                true
            }
            None => false,
        }
    }

    /// Runs the required check against the stored value. Returns true when valid.
    pub fn validate(&self, instance: &mut Instance) -> bool {
        let value = self.stored(instance);
        let outcome = match &self.options.required {
            Required::Off => return true,
            Required::On if self.is_empty(&value) => {
                RequiredOutcome::Message(REQUIRED_MESSAGE.to_string())
            }
            Required::On => RequiredOutcome::Pass,
            Required::Check(check) => check(&HookArgs {
                instance,
                path: &self.path,
                prev_value: &value,
                value: &value,
            }),
        };
        let raised = match outcome {
            RequiredOutcome::Message(message) if !message.is_empty() => {
                vec![PathError::new(&self.path, message)]
            }
            RequiredOutcome::Errors(errors) => errors
                .into_iter()
                .filter(|raised| !raised.error.is_empty())
                .collect(),
            _ => Vec::new(),
        };
        let paths: Vec<Path> = raised.iter().map(|raised| raised.path.clone()).collect();
        // required errors this field raised last time and does not raise now
        let stale = self.flagged.replace(paths.clone());
        for path in stale.iter().chain([&self.path]) {
            if !paths.contains(path) && instance.has_required_error(path) {
                instance.unset_error(path, false);
            }
        }
        for PathError { path, error } in raised {
            instance.set_error(path, error, false, true);
        }
        paths.is_empty()
    }

    /// Cancels the pending commit and leaves the instance's registry.
    pub fn unmount(&self, instance: &mut Instance) {
        self.pending.borrow_mut().cancel();
        self.flagged.borrow_mut().clear();
        instance.unregister_item(&self.id);
        debug!(field = %self.id, "field unmounted");
    }

    fn stored(&self, instance: &Instance) -> FormValue {
        match &self.options.default {
            Some(default) => instance.get_or(&self.path, default.clone()),
            None => instance.get(&self.path),
        }
    }

    fn commit_value(&self, instance: &mut Instance, raw: FormValue) {
        let prev = instance.get(&self.path);
        let value = match &self.options.transform_out {
            Some(transform) => transform(&HookArgs {
                instance,
                path: &self.path,
                prev_value: &prev,
                value: &raw,
            }),
            None => raw,
        };
        instance.set(&self.path, value.clone(), false);
        if let Some(effect) = &self.options.effect {
            effect(EffectArgs {
                instance: &mut *instance,
                path: &self.path,
                prev_value: &prev,
                value: &value,
            });
        }
        self.validate(instance);
    }

    fn is_empty(&self, value: &FormValue) -> bool {
        match (value, &self.options.empty) {
            (FormValue::Null, _) => true,
            (FormValue::String(text), FormValue::String(empty)) => text.trim() == empty.as_str(),
            (value, empty) => value == empty,
        }
    }
}

impl ReportImmediate for Field {
    fn report_form_immediate(&self, instance: &mut Instance) {
        if !self.commit(instance) {
            self.validate(instance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        form::{options::InstanceOptions, schedule::ManualClock},
        path,
    };
    use serde_json::json;
    use std::cell::Cell;

    fn instance(raw: serde_json::Value) -> (Instance, ManualClock) {
        let clock = ManualClock::new();
        let options = InstanceOptions::default().with_clock(clock.clone());
        (Instance::with_options(FormValue::from(raw), options), clock)
    }

    #[test]
    fn mount_rejects_root_path() {
        let (mut form, _) = instance(json!({}));
        let err = Field::mount(&mut form, Path::root(), FieldOptions::default()).unwrap_err();
        assert_eq!(err, FormError::EmptyPath { what: "field" });
    }

    #[test]
    fn mount_seeds_default_and_registers() {
        let (mut form, _) = instance(json!({}));
        let field = Field::mount(
            &mut form,
            path!["port"],
            FieldOptions::default().with_default(8080),
        )
        .unwrap();
        assert_eq!(form.get(path!["port"]), FormValue::from(8080));
        assert_eq!(form.item_count(), 1);
        field.unmount(&mut form);
        assert_eq!(form.item_count(), 0);
    }

    #[test]
    fn debounced_input_reschedules_single_commit() {
        let (mut form, clock) = instance(json!({"name": ""}));
        let field = Field::mount(
            &mut form,
            path!["name"],
            FieldOptions::default().with_debounce(Duration::from_millis(100)),
        )
        .unwrap();
        field.input(&mut form, "a");
        clock.advance(Duration::from_millis(60));
        field.input(&mut form, "ab");
        clock.advance(Duration::from_millis(60));
        assert!(!field.poll(&mut form), "second keystroke restarted the window");
        assert_eq!(field.value(&form), FormValue::from("ab"));
        assert_eq!(form.get(path!["name"]), FormValue::from(""));
        clock.advance(Duration::from_millis(40));
        assert!(field.poll(&mut form));
        assert_eq!(form.get(path!["name"]), FormValue::from("ab"));
        assert!(!field.has_pending());
    }

    #[test]
    fn transforms_wrap_the_stored_value() {
        let (mut form, _) = instance(json!({"tags": ["a", "b"]}));
        let field = Field::mount(
            &mut form,
            path!["tags"],
            FieldOptions::default()
                .with_transform_in(|args| {
                    let joined = args
                        .value
                        .as_array()
                        .unwrap_or_default()
                        .iter()
                        .filter_map(FormValue::as_str)
                        .collect::<Vec<_>>()
                        .join(",");
                    FormValue::from(joined)
                })
                .with_transform_out(|args| {
                    let parts = args
                        .value
                        .as_str()
                        .unwrap_or_default()
                        .split(',')
                        .map(FormValue::from)
                        .collect::<Vec<_>>();
                    FormValue::from(parts)
                })
                .with_child_transform(|args| {
                    FormValue::from(args.value.as_str().unwrap_or_default().to_uppercase())
                }),
        )
        .unwrap();
        assert_eq!(field.value(&form), FormValue::from("a,b"));
        assert_eq!(field.display_value(&form), FormValue::from("A,B"));
        field.input(&mut form, "x,y,z");
        assert_eq!(form.get(path!["tags"]), FormValue::from(json!(["x", "y", "z"])));
    }

    #[test]
    fn effect_sees_previous_value_and_may_write() {
        let (mut form, _) = instance(json!({"country": "fr", "city": "Paris"}));
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let field = Field::mount(
            &mut form,
            path!["country"],
            FieldOptions::default().with_effect(move |args| {
                seen.set(seen.get() + 1);
                if args.prev_value != args.value {
                    args.instance.set(path!["city"], "", true);
                }
            }),
        )
        .unwrap();
        field.input(&mut form, "de");
        assert_eq!(calls.get(), 1);
        assert_eq!(form.get(path!["city"]), FormValue::from(""));
    }

    #[test]
    fn custom_check_can_flag_other_paths() {
        let (mut form, _) = instance(json!({"range": {"from": 5, "to": 1}}));
        let field = Field::mount(
            &mut form,
            path!["range"],
            FieldOptions::default().with_required_check(|args| {
                let from = args.instance.get(path!["range", "from"]).as_i64();
                let to = args.instance.get(path!["range", "to"]).as_i64();
                if from > to {
                    PathError::new(path!["range", "to"], "must follow from").into()
                } else {
                    RequiredOutcome::Pass
                }
            }),
        )
        .unwrap();
        assert!(!field.validate(&mut form));
        assert_eq!(
            form.get_error(path!["range", "to"]),
            Some(FormValue::from("must follow from"))
        );
        assert!(form.has_required_error(path!["range", "to"]));
        field.unmount(&mut form);
    }

    #[test]
    fn passing_check_clears_errors_it_raised_on_other_paths() {
        let (mut form, _) = instance(json!({"range": {"from": 5, "to": 1}}));
        let field = Field::mount(
            &mut form,
            path!["range"],
            FieldOptions::default().with_required_check(|args| {
                let from = args.instance.get(path!["range", "from"]).as_i64();
                let to = args.instance.get(path!["range", "to"]).as_i64();
                if from > to {
                    PathError::new(path!["range", "to"], "must follow from").into()
                } else {
                    RequiredOutcome::Pass
                }
            }),
        )
        .unwrap();
        assert!(!field.validate(&mut form));
        assert_eq!(form.errors_count(), 1);

        form.set(path!["range", "to"], 9, false);
        assert!(field.validate(&mut form));
        assert_eq!(form.errors(), &FormValue::object());
        assert_eq!(form.errors_count(), 0);
        assert!(form.required_errors().is_empty());
    }

    #[test]
    fn check_moving_its_error_drops_the_old_one() {
        let (mut form, _) = instance(json!({"a": 0, "b": 0}));
        let target = Rc::new(std::cell::RefCell::new("a"));
        let pick = Rc::clone(&target);
        let field = Field::mount(
            &mut form,
            path!["a"],
            FieldOptions::default().with_required_check(move |_| {
                PathError::new(path![*pick.borrow()], "bad").into()
            }),
        )
        .unwrap();
        field.validate(&mut form);
        *target.borrow_mut() = "b";
        assert!(!field.validate(&mut form));
        assert_eq!(form.errors(), &FormValue::from(json!({"b": "bad"})));
    }

    #[test]
    fn passing_required_check_clears_only_required_errors() {
        let (mut form, _) = instance(json!({"name": ""}));
        let field = Field::mount(
            &mut form,
            path!["name"],
            FieldOptions::default().with_required(true),
        )
        .unwrap();
        assert!(!field.validate(&mut form));
        field.input(&mut form, "ada");
        assert_eq!(form.get_error(path!["name"]), None);

        form.set_error(path!["name"], "taken", false, false);
        assert!(field.validate(&mut form));
        assert_eq!(form.get_error(path!["name"]), Some(FormValue::from("taken")));
    }
}
