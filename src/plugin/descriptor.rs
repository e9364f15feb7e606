//! Plugin type descriptors: everything declared for one plugin type.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::PluginError;
use crate::plugin::argument::{ArgumentDef, ArgumentGroup};
use crate::plugin::resolve::{resolve, DefaultHooks, PluginHooks, PluginInstance};
use crate::plugin::settings::{PluginSettings, SettingId};

/// Produces fresh hook state for each construction attempt.
pub type HookFactory = Arc<dyn Fn() -> Box<dyn PluginHooks> + Send + Sync>;

/// Declared metadata of a plugin type.
#[derive(Clone)]
pub struct PluginType {
    name: String,
    opt_token: Option<String>,
    arguments: Vec<ArgumentDef>,
    groups: Vec<String>,
    settings: PluginSettings,
    hooks: HookFactory,
}

impl PluginType {
    /// A type derived from the abstract base: no arguments, no settings.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            opt_token: None,
            arguments: Vec::new(),
            groups: Vec::new(),
            settings: PluginSettings::default(),
            hooks: Arc::new(|| Box::new(DefaultHooks) as Box<dyn PluginHooks>),
        }
    }

    /// A type derived from `self`.
    ///
    /// Arguments are copied field by field with fresh value slots; settings,
    /// opt token and hooks carry over. Group memberships do not.
    pub fn derive(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            opt_token: self.opt_token.clone(),
            arguments: self.arguments.iter().map(ArgumentDef::inherit).collect(),
            groups: Vec::new(),
            settings: self.settings.clone(),
            hooks: Arc::clone(&self.hooks),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opt_token(&self) -> Option<&str> {
        self.opt_token.as_deref()
    }

    /// All arguments, ancestors first, in declaration order.
    pub fn arguments(&self) -> &[ArgumentDef] {
        &self.arguments
    }

    /// Arguments whose group is in `groups`; `None` means every argument.
    pub fn arguments_in<'a>(
        &'a self,
        groups: Option<&'a [ArgumentGroup]>,
    ) -> impl Iterator<Item = &'a ArgumentDef> + 'a {
        self.arguments
            .iter()
            .filter(move |a| groups.map_or(true, |g| g.contains(&a.group)))
    }

    /// First argument declared under `name`.
    pub fn argument(&self, name: &str) -> Option<&ArgumentDef> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Registry groups this type joined, in declaration order.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PluginSettings {
        &mut self.settings
    }

    pub fn setting(&self, id: SettingId) -> bool {
        self.settings.get(id)
    }

    pub fn is_disabled(&self) -> bool {
        self.setting(SettingId::Disabled)
    }

    /// Whether construction needs at least one supplied value.
    pub fn arguments_required(&self) -> bool {
        self.arguments
            .iter()
            .any(|a| a.group == ArgumentGroup::Constructor && !a.optional)
    }

    /// Build an instance from an optional configuration mapping.
    pub fn construct(&self, config: Option<&Value>) -> Result<PluginInstance, PluginError> {
        resolve(self, config)
    }

    pub(crate) fn new_hooks(&self) -> Box<dyn PluginHooks> {
        (self.hooks)()
    }

    pub(crate) fn push_argument(&mut self, argument: ArgumentDef) {
        self.arguments.push(argument);
    }

    /// Returns `false` when the type already was a member.
    pub(crate) fn join_group(&mut self, group: &str) -> bool {
        if self.groups.iter().any(|g| g == group) {
            return false;
        }
        self.groups.push(group.to_string());
        true
    }

    pub(crate) fn set_opt_token(&mut self, token: String) {
        self.opt_token = Some(token);
    }

    pub(crate) fn set_hooks(&mut self, hooks: HookFactory) {
        self.hooks = hooks;
    }
}

impl fmt::Debug for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginType")
            .field("name", &self.name)
            .field("opt_token", &self.opt_token)
            .field("arguments", &self.arguments)
            .field("groups", &self.groups)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
