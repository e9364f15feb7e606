//! Argument descriptors: one declared, named constructor argument.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Which resolution scope an argument belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ArgumentGroup {
    /// Resolved into an instance field by the default constructor.
    #[default]
    Constructor,
    /// Surfaced as a flag only; consumed by custom hooks.
    CommandLine,
    /// Any other tag, consumed by custom hooks only.
    Custom(String),
}

impl ArgumentGroup {
    /// Stable name of the group.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Constructor => "constructor",
            Self::CommandLine => "command_line",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for ArgumentGroup {
    fn from(name: &str) -> Self {
        match name {
            "constructor" => Self::Constructor,
            "command_line" => Self::CommandLine,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Type hint deciding the flag shape of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgKind {
    /// Toggle flag (negatable unless the argument is `simple`).
    Boolean,
    /// Repeatable string flag accumulating into a sequence.
    List,
    /// Single string flag.
    Scalar,
    /// No hint, rendered like `Scalar`.
    #[default]
    Unspecified,
}

/// Predicate deciding whether a candidate value is acceptable.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Validator {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn accepts(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Shared slot holding the most recently parsed value of an argument.
///
/// Clones share the slot: a write through one handle is visible to all.
#[derive(Debug, Clone, Default)]
pub struct ValueSlot(Arc<RwLock<Option<Value>>>);

impl ValueSlot {
    pub fn get(&self) -> Option<Value> {
        self.0.read().clone()
    }

    pub fn set(&self, value: Value) {
        *self.0.write() = Some(value);
    }

    /// Append to the sequence held in the slot, starting one if empty.
    pub fn push(&self, item: Value) {
        let mut guard = self.0.write();
        match guard.as_mut() {
            Some(Value::Array(items)) => items.push(item),
            _ => *guard = Some(Value::Array(vec![item])),
        }
    }

    pub fn is_set(&self) -> bool {
        self.0.read().is_some()
    }
}

/// Metadata for one declared argument.
#[derive(Debug, Clone)]
pub struct ArgumentDef {
    pub name: String,
    pub group: ArgumentGroup,
    /// Used when `optional` and nothing valid was supplied. `Null` when unset.
    pub default: Value,
    pub optional: bool,
    pub validator: Option<Validator>,
    pub kind: ArgKind,
    /// Boolean flags only: presence-only instead of a negatable pair.
    pub simple: bool,
    pub description: Option<String>,
    value: ValueSlot,
}

impl ArgumentDef {
    /// A required constructor argument with no hints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: ArgumentGroup::Constructor,
            default: Value::Null,
            optional: false,
            validator: None,
            kind: ArgKind::Unspecified,
            simple: false,
            description: None,
            value: ValueSlot::default(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn group(mut self, group: impl Into<ArgumentGroup>) -> Self {
        self.group = group.into();
        self
    }

    pub fn kind(mut self, kind: ArgKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn simple(mut self) -> Self {
        self.simple = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validator<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Validator::new(predicate));
        self
    }

    /// Whether `value` passes the validator (always true without one).
    pub fn accepts(&self, value: &Value) -> bool {
        self.validator.as_ref().map_or(true, |v| v.accepts(value))
    }

    /// Current transient value, if a parse has set one.
    pub fn value(&self) -> Option<Value> {
        self.value.get()
    }

    /// Handle to the shared value slot.
    pub fn slot(&self) -> &ValueSlot {
        &self.value
    }

    /// Whether the transient value is set and accepted by the validator.
    pub fn has_valid_value(&self) -> bool {
        self.value().is_some_and(|v| self.accepts(&v))
    }

    /// Copy every field into a new descriptor with its own, empty value slot.
    pub fn inherit(&self) -> Self {
        Self {
            value: ValueSlot::default(),
            ..self.clone()
        }
    }
}
