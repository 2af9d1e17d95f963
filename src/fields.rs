use std::fmt;

use crate::config::LayoutConfig;

/// Stable identifier of every field the layout can render.
///
/// The string form (see [`FieldKey::as_str`]) is what configuration refers
/// to; nested fields are namespaced with a dot, e.g. `location.class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Exception,
    Level,
    Location,
    Logger,
    Message,
    Mdc,
    Ndc,
    Host,
    Path,
    Tags,
    Timestamp,
    Thread,
    Version,
    LocationClass,
    LocationFile,
    LocationMethod,
    LocationLine,
    ExceptionClass,
    ExceptionMessage,
    ExceptionStacktrace,
}

impl FieldKey {
    /// All keys in registry order.
    pub const ALL: [FieldKey; 20] = [
        FieldKey::Exception,
        FieldKey::Level,
        FieldKey::Location,
        FieldKey::Logger,
        FieldKey::Message,
        FieldKey::Mdc,
        FieldKey::Ndc,
        FieldKey::Host,
        FieldKey::Path,
        FieldKey::Tags,
        FieldKey::Timestamp,
        FieldKey::Thread,
        FieldKey::Version,
        FieldKey::LocationClass,
        FieldKey::LocationFile,
        FieldKey::LocationMethod,
        FieldKey::LocationLine,
        FieldKey::ExceptionClass,
        FieldKey::ExceptionMessage,
        FieldKey::ExceptionStacktrace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Exception => "exception",
            FieldKey::Level => "level",
            FieldKey::Location => "location",
            FieldKey::Logger => "logger",
            FieldKey::Message => "message",
            FieldKey::Mdc => "mdc",
            FieldKey::Ndc => "ndc",
            FieldKey::Host => "host",
            FieldKey::Path => "path",
            FieldKey::Tags => "tags",
            FieldKey::Timestamp => "@timestamp",
            FieldKey::Thread => "thread",
            FieldKey::Version => "@version",
            FieldKey::LocationClass => "location.class",
            FieldKey::LocationFile => "location.file",
            FieldKey::LocationMethod => "location.method",
            FieldKey::LocationLine => "location.line",
            FieldKey::ExceptionClass => "exception.class",
            FieldKey::ExceptionMessage => "exception.message",
            FieldKey::ExceptionStacktrace => "exception.stacktrace",
        }
    }

    /// Label used in the output until the field is renamed.
    pub fn default_label(self) -> &'static str {
        match self {
            FieldKey::LocationClass | FieldKey::ExceptionClass => "class",
            FieldKey::LocationFile => "file",
            FieldKey::LocationMethod => "method",
            FieldKey::LocationLine => "line",
            FieldKey::ExceptionMessage => "message",
            FieldKey::ExceptionStacktrace => "stacktrace",
            top_level => top_level.as_str(),
        }
    }

    pub fn parse(key: &str) -> Option<FieldKey> {
        FieldKey::ALL.into_iter().find(|k| k.as_str() == key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One renderable field: its key, output label and enabled state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    key: FieldKey,
    label: String,
    enabled: bool,
}

impl FieldDescriptor {
    fn new(key: FieldKey) -> Self {
        FieldDescriptor {
            key,
            label: key.default_label().to_string(),
            // Resolving the call site is expensive, so it is opt-in.
            enabled: key != FieldKey::Location,
        }
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn default_label(&self) -> &'static str {
        self.key.default_label()
    }

    /// Current output label.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// The fixed set of fields the layout knows about.
///
/// Structure never changes after construction; configuration only flips
/// `enabled` flags and replaces labels. Lookups by [`FieldKey`] are O(1)
/// and are what the render path uses; the string based operations scan the
/// whole list and are meant for configuration time only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRegistry {
    pub fn new() -> Self {
        FieldRegistry {
            fields: FieldKey::ALL.into_iter().map(FieldDescriptor::new).collect(),
        }
    }

    /// Fresh registry with `config` applied: includes first, then renames,
    /// then excludes. Exclusion therefore wins over inclusion, and renames
    /// apply whether or not the field ends up enabled.
    pub fn configured(config: &LayoutConfig) -> Self {
        let mut registry = FieldRegistry::new();
        for prefix in config.included() {
            registry.enable_prefix(prefix);
        }
        for (key, label) in config.renames() {
            registry.relabel(key, label);
        }
        for prefix in config.excluded() {
            registry.disable_prefix(prefix);
        }
        registry
    }

    pub fn get(&self, key: FieldKey) -> &FieldDescriptor {
        &self.fields[key.index()]
    }

    pub fn is_enabled(&self, key: FieldKey) -> bool {
        self.get(key).enabled
    }

    pub fn label(&self, key: FieldKey) -> &str {
        &self.get(key).label
    }

    /// Look a descriptor up by its exact key string.
    pub fn find(&self, key: &str) -> Option<&FieldDescriptor> {
        FieldKey::parse(key).map(|k| self.get(k))
    }

    /// Descriptors whose key starts with `prefix`.
    pub fn matching_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a FieldDescriptor> + 'a {
        self.fields
            .iter()
            .filter(move |field| field.key.as_str().starts_with(prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Enable every field whose key starts with `prefix`.
    ///
    /// Labels are never consulted, so renamed fields are still addressed
    /// by their original key.
    pub fn enable_prefix(&mut self, prefix: &str) {
        self.set_enabled_by_prefix(prefix, true);
    }

    /// Disable every field whose key starts with `prefix`.
    pub fn disable_prefix(&mut self, prefix: &str) {
        self.set_enabled_by_prefix(prefix, false);
    }

    /// Replace the output label of the field with exactly this key.
    /// Unknown keys are ignored.
    pub fn relabel(&mut self, key: &str, label: &str) {
        if let Some(key) = FieldKey::parse(key) {
            self.fields[key.index()].label = label.to_string();
        }
    }

    fn set_enabled_by_prefix(&mut self, prefix: &str, enabled: bool) {
        for field in &mut self.fields {
            if field.key.as_str().starts_with(prefix) {
                field.enabled = enabled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_index_their_own_slot() {
        let registry = FieldRegistry::new();
        for key in FieldKey::ALL {
            assert_eq!(registry.get(key).key(), key);
            assert_eq!(FieldKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn only_location_is_disabled_by_default() {
        let registry = FieldRegistry::new();
        let disabled: Vec<_> = registry
            .iter()
            .filter(|f| !f.is_enabled())
            .map(|f| f.key())
            .collect();
        assert_eq!(disabled, vec![FieldKey::Location]);
        assert!(registry.is_enabled(FieldKey::LocationClass));
    }

    #[test]
    fn nested_fields_use_short_default_labels() {
        let registry = FieldRegistry::new();
        assert_eq!(registry.label(FieldKey::LocationClass), "class");
        assert_eq!(registry.label(FieldKey::ExceptionStacktrace), "stacktrace");
        assert_eq!(registry.label(FieldKey::Timestamp), "@timestamp");
    }

    #[test]
    fn prefix_disable_reaches_nested_fields() {
        let mut registry = FieldRegistry::new();
        registry.disable_prefix("exception");
        assert!(!registry.is_enabled(FieldKey::Exception));
        assert!(!registry.is_enabled(FieldKey::ExceptionClass));
        assert!(!registry.is_enabled(FieldKey::ExceptionMessage));
        assert!(!registry.is_enabled(FieldKey::ExceptionStacktrace));
        assert!(registry.is_enabled(FieldKey::Message));
    }

    #[test]
    fn prefix_matching_ignores_labels() {
        let mut registry = FieldRegistry::new();
        registry.relabel("level", "severity");
        registry.disable_prefix("severity");
        assert!(registry.is_enabled(FieldKey::Level));
        registry.disable_prefix("level");
        assert!(!registry.is_enabled(FieldKey::Level));
        assert_eq!(registry.label(FieldKey::Level), "severity");
    }

    #[test]
    fn relabel_requires_exact_key() {
        let mut registry = FieldRegistry::new();
        registry.relabel("location", "loc");
        assert_eq!(registry.label(FieldKey::Location), "loc");
        assert_eq!(registry.label(FieldKey::LocationClass), "class");

        registry.relabel("loc", "nope");
        registry.relabel("class", "nope");
        assert_eq!(registry.find("location").unwrap().label(), "loc");
        assert_eq!(registry.find("location.class").unwrap().label(), "class");
    }

    #[test]
    fn unknown_prefix_is_a_no_op() {
        let mut registry = FieldRegistry::new();
        registry.disable_prefix("nonexistent");
        assert_eq!(registry, FieldRegistry::new());
        assert_eq!(registry.matching_prefix("nonexistent").count(), 0);
        assert!(registry.find("nonexistent").is_none());
    }

    #[test]
    fn configured_applies_exclude_after_include() {
        let config = LayoutConfig::default()
            .with_included_fields("location")
            .with_excluded_fields("location.line, thread")
            .with_renamed_fields("thread:threadName");
        let registry = FieldRegistry::configured(&config);
        assert!(registry.is_enabled(FieldKey::Location));
        assert!(registry.is_enabled(FieldKey::LocationClass));
        assert!(!registry.is_enabled(FieldKey::LocationLine));
        assert!(!registry.is_enabled(FieldKey::Thread));
        assert_eq!(registry.label(FieldKey::Thread), "threadName");
    }

    #[test]
    fn exclude_beats_include_for_same_key() {
        let config = LayoutConfig::default()
            .with_included_fields("location")
            .with_excluded_fields("location");
        let registry = FieldRegistry::configured(&config);
        assert!(!registry.is_enabled(FieldKey::Location));
    }

    #[test]
    fn short_prefix_matches_several_groups() {
        let registry = FieldRegistry::new();
        let keys: Vec<_> = registry.matching_prefix("lo").map(|f| f.key()).collect();
        assert_eq!(
            keys,
            vec![
                FieldKey::Location,
                FieldKey::Logger,
                FieldKey::LocationClass,
                FieldKey::LocationFile,
                FieldKey::LocationMethod,
                FieldKey::LocationLine,
            ]
        );
    }
}
