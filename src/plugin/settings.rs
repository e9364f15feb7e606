use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

/// Settings the registry understands.
///
/// Adding a new setting: add a variant here and teach the registry to honour it.
/// The `as_str()` value is used as the config key. Once published, do not rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingId {
    /// Hidden from iteration and never instantiated.
    Disabled,
    /// Skipped by bulk instantiation, still constructible explicitly.
    SkipAutoInitialization,
}

impl SettingId {
    /// Stable key for configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::SkipAutoInitialization => "skip_auto_initialization",
        }
    }

    /// All variants for iteration.
    pub fn all() -> &'static [SettingId] {
        &[Self::Disabled, Self::SkipAutoInitialization]
    }

    /// Parse from config key. Unknown keys return `None` (forward compat).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "disabled" => Some(Self::Disabled),
            "skip_auto_initialization" => Some(Self::SkipAutoInitialization),
            _ => None,
        }
    }
}

/// Per-type settings: recognised flags plus opaque extension data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSettings {
    values: HashMap<SettingId, bool>,
    extensions: BTreeMap<String, Value>,
}

impl PluginSettings {
    /// Current value of a setting (unset means `false`).
    pub fn get(&self, id: SettingId) -> bool {
        self.values.get(&id).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: SettingId, value: bool) {
        self.values.insert(id, value);
    }

    /// Unrecognised setting by key.
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) {
        self.extensions.insert(key.into(), value);
    }

    /// Set a setting by its config key.
    ///
    /// Recognised keys with a boolean value become typed settings; anything
    /// else lands in the extension map.
    pub fn set_raw(&mut self, key: &str, value: Value) {
        match (SettingId::parse(key), value.as_bool()) {
            (Some(id), Some(flag)) => self.set(id, flag),
            _ => self.set_extension(key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_settings_are_false() {
        let settings = PluginSettings::default();
        for id in SettingId::all() {
            assert!(!settings.get(*id));
        }
    }

    #[test]
    fn keys_round_trip() {
        for id in SettingId::all() {
            assert_eq!(SettingId::parse(id.as_str()), Some(*id));
        }
        assert_eq!(SettingId::parse("unknown"), None);
    }

    #[test]
    fn set_raw_routes_unknown_keys_to_extensions() {
        let mut settings = PluginSettings::default();
        settings.set_raw("disabled", json!(true));
        settings.set_raw("priority", json!(3));
        settings.set_raw("skip_auto_initialization", json!("yes"));

        assert!(settings.get(SettingId::Disabled));
        assert!(!settings.get(SettingId::SkipAutoInitialization));
        assert_eq!(settings.extension("priority"), Some(&json!(3)));
        assert_eq!(
            settings.extension("skip_auto_initialization"),
            Some(&json!("yes"))
        );
    }
}
