//! Plugin registry: the single store of declared plugin types.
//!
//! The host creates one registry at startup and passes it by reference to
//! declaration, flag binding and bulk instantiation.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::PluginError;
use crate::plugin::{
    ArgumentDef, HookFactory, PluginHooks, PluginInstance, PluginType, SettingId,
};

/// A registered type together with its stored instance, if any.
#[derive(Debug, Clone, Copy)]
pub struct PluginEntry<'a> {
    pub plugin_type: &'a PluginType,
    pub instance: Option<&'a PluginInstance>,
}

/// Registered plugin types, groups and instances.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    types: Vec<PluginType>,
    index: HashMap<String, usize>,
    groups: HashMap<String, Vec<String>>,
    instances: HashMap<String, PluginInstance>,
    scope: Option<String>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type derived from the abstract base.
    pub fn declare(&mut self, name: impl Into<String>) -> Declaration<'_> {
        let index = self.register(PluginType::root(name));
        Declaration {
            registry: self,
            index,
        }
    }

    /// Declare a type derived from the registered type `parent`.
    ///
    /// The parent's arguments, settings, opt token and hooks are copied
    /// before any of the new type's own declarations run.
    pub fn derive(
        &mut self,
        name: impl Into<String>,
        parent: &str,
    ) -> Result<Declaration<'_>, PluginError> {
        let parent_type = self.lookup(parent).ok_or_else(|| PluginError::TypeNotFound {
            name: parent.to_string(),
        })?;
        let derived = parent_type.derive(name);
        tracing::debug!(
            plugin = %derived.name(),
            parent = %parent,
            inherited = derived.arguments().len(),
            "Derived plugin type"
        );
        let index = self.register(derived);
        Ok(Declaration {
            registry: self,
            index,
        })
    }

    /// Insert `plugin_type` keyed by its name, replacing an existing entry in place.
    pub fn register(&mut self, plugin_type: PluginType) -> usize {
        let name = plugin_type.name().to_string();
        if let Some(&index) = self.index.get(&name) {
            self.types[index] = plugin_type;
            return index;
        }

        tracing::debug!(plugin = %name, "Registered plugin type");
        self.types.push(plugin_type);
        let index = self.types.len() - 1;
        self.index.insert(name, index);
        index
    }

    /// Add the named type to `group`. The group springs into existence on first use.
    pub fn add_to_group(&mut self, type_name: &str, group: &str) {
        let members = self.groups.entry(group.to_string()).or_default();
        if !members.iter().any(|m| m == type_name) {
            members.push(type_name.to_string());
        }
    }

    /// Prefix prepended (as `scope::name`) to names passed to lookups.
    pub fn set_scope(&mut self, scope: Option<String>) {
        self.scope = scope;
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    fn scoped(&self, name: &str) -> String {
        match &self.scope {
            Some(scope) => format!("{}::{}", scope, name),
            None => name.to_string(),
        }
    }

    /// `name` with the scope prefix removed, when present.
    pub fn unscoped<'a>(&self, name: &'a str) -> &'a str {
        self.scope
            .as_deref()
            .and_then(|scope| name.strip_prefix(scope))
            .and_then(|rest| rest.strip_prefix("::"))
            .unwrap_or(name)
    }

    /// Position of `name` in `types`: the scoped name first, then `name` as given.
    fn position(&self, name: &str) -> Option<usize> {
        self.index
            .get(&self.scoped(name))
            .or_else(|| self.index.get(name))
            .copied()
    }

    /// Look up a type by its unscoped name.
    ///
    /// Falls back to the exact name, so types declared before a scope was
    /// configured stay reachable.
    pub fn lookup(&self, name: &str) -> Option<&PluginType> {
        self.position(name).map(|index| &self.types[index])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut PluginType> {
        let index = self.position(name)?;
        Some(&mut self.types[index])
    }

    /// Stored instance of a type, by unscoped name.
    pub fn instance(&self, name: &str) -> Option<&PluginInstance> {
        let index = self.position(name)?;
        self.instances.get(self.types[index].name())
    }

    /// Every registered type, disabled ones included, in registration order.
    pub fn types(&self) -> impl Iterator<Item = &PluginType> {
        self.types.iter()
    }

    /// Names of the members of `group`, if anyone joined it.
    pub fn group_members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Enabled types, optionally restricted to one group.
    pub fn each(&self, group: Option<&str>) -> Result<Vec<PluginEntry<'_>>, PluginError> {
        let selected: Vec<&PluginType> = match group {
            None => self.types.iter().collect(),
            Some(group) => self
                .groups
                .get(group)
                .ok_or_else(|| PluginError::GroupNotFound {
                    group: group.to_string(),
                })?
                .iter()
                .filter_map(|name| self.index.get(name).map(|&index| &self.types[index]))
                .collect(),
        };

        Ok(selected
            .into_iter()
            .filter(|plugin_type| !plugin_type.is_disabled())
            .map(|plugin_type| PluginEntry {
                plugin_type,
                instance: self.instances.get(plugin_type.name()),
            })
            .collect())
    }

    /// Construct the type registered under `name` (unscoped).
    pub fn construct(
        &self,
        name: &str,
        config: Option<&Value>,
    ) -> Result<PluginInstance, PluginError> {
        let plugin_type = self.lookup(name).ok_or_else(|| PluginError::TypeNotFound {
            name: name.to_string(),
        })?;
        plugin_type.construct(config)
    }

    /// Construct every eligible type and store the instances.
    ///
    /// `config` maps type name (full or unscoped) to that type's options;
    /// `defaults` applies to every type. Failures are logged and skipped.
    pub fn initialize_plugins(&mut self, config: &Map<String, Value>, defaults: &Map<String, Value>) {
        for plugin_type in &self.types {
            if plugin_type.is_disabled() || plugin_type.setting(SettingId::SkipAutoInitialization) {
                continue;
            }

            let name = plugin_type.name();
            let own = config
                .get(name)
                .or_else(|| config.get(self.unscoped(name)))
                .and_then(Value::as_object);

            let mut merged = defaults.clone();
            if let Some(own) = own {
                merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
            }

            match plugin_type.construct(Some(&Value::Object(merged))) {
                Ok(instance) => {
                    tracing::debug!(plugin = %name, "Initialized plugin");
                    self.instances.insert(name.to_string(), instance);
                }
                Err(err) => {
                    tracing::debug!(plugin = %name, error = %err, "Skipping plugin");
                }
            }
        }
    }
}

/// Builder for a type being declared; each call mutates the registered descriptor.
pub struct Declaration<'r> {
    registry: &'r mut PluginRegistry,
    index: usize,
}

impl<'r> Declaration<'r> {
    fn plugin_type(&mut self) -> &mut PluginType {
        &mut self.registry.types[self.index]
    }

    /// Append an argument (redeclaring an inherited name appends a second one).
    pub fn argument(mut self, argument: ArgumentDef) -> Self {
        self.plugin_type().push_argument(argument);
        self
    }

    /// Join a registry group.
    pub fn group(mut self, group: &str) -> Self {
        if self.plugin_type().join_group(group) {
            let name = self.plugin_type().name().to_string();
            self.registry.add_to_group(&name, group);
        }
        self
    }

    pub fn setting(mut self, id: SettingId, value: bool) -> Self {
        self.plugin_type().settings_mut().set(id, value);
        self
    }

    /// Store a setting the registry does not interpret.
    pub fn extension(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.plugin_type().settings_mut().set_extension(key, value.into());
        self
    }

    /// Use `token` instead of the type name as flag prefix.
    pub fn opt_token(mut self, token: impl Into<String>) -> Self {
        self.plugin_type().set_opt_token(token.into());
        self
    }

    /// Attach per-instance hooks built by `factory` for each construction.
    pub fn hooks<H, F>(mut self, factory: F) -> Self
    where
        H: PluginHooks + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: HookFactory = Arc::new(move || Box::new(factory()) as Box<dyn PluginHooks>);
        self.plugin_type().set_hooks(factory);
        self
    }

    pub fn name(&self) -> &str {
        self.registry.types[self.index].name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declare_registers_before_body() {
        let mut registry = PluginRegistry::new();
        let declaration = registry.declare("TestPlugin");
        assert_eq!(declaration.name(), "TestPlugin");
        assert!(registry.lookup("TestPlugin").is_some());
    }

    #[test]
    fn register_replaces_in_place() {
        let mut registry = PluginRegistry::new();
        registry.declare("A").argument(ArgumentDef::new("x"));
        registry.declare("B");
        registry.declare("A");

        let names: Vec<_> = registry.types().map(PluginType::name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(registry.lookup("A").is_some_and(|t| t.arguments().is_empty()));
    }

    #[test]
    fn scope_prefixes_lookups() {
        let mut registry = PluginRegistry::new();
        registry.declare("Acme::Echo");
        assert!(registry.lookup("Echo").is_none());

        registry.set_scope(Some("Acme".to_string()));
        assert!(registry.lookup("Echo").is_some());
        assert_eq!(registry.unscoped("Acme::Echo"), "Echo");
        assert_eq!(registry.unscoped("Other::Echo"), "Other::Echo");
    }

    #[test]
    fn scoped_lookup_falls_back_to_exact_name() {
        let mut registry = PluginRegistry::new();
        registry.declare("Echo").argument(ArgumentDef::new("message").optional());
        registry.set_scope(Some("Acme".to_string()));

        assert_eq!(registry.lookup("Echo").map(PluginType::name), Some("Echo"));
        assert!(registry.lookup_mut("Echo").is_some());

        registry.initialize_plugins(&Map::new(), &Map::new());
        assert!(registry.instance("Echo").is_some());
    }

    #[test]
    fn derive_from_unknown_parent_fails() {
        let mut registry = PluginRegistry::new();
        let err = registry.derive("Child", "Missing").err();
        assert_eq!(
            err,
            Some(PluginError::TypeNotFound {
                name: "Missing".to_string()
            })
        );
    }

    #[test]
    fn initialize_plugins_accepts_unscoped_keys() {
        let mut registry = PluginRegistry::new();
        registry
            .declare("Acme::Echo")
            .argument(ArgumentDef::new("message"));
        registry.set_scope(Some("Acme".to_string()));

        let config = json!({ "Echo": { "message": "hi" } });
        registry.initialize_plugins(config.as_object().unwrap_or(&Map::new()), &Map::new());

        let instance = registry.instance("Echo");
        assert_eq!(instance.and_then(|i| i.get("message")), Some(&json!("hi")));
    }
}
