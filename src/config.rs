use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::env::{
    env_opt, JSON_LAYOUT_EXCLUDED_FIELDS_ENV, JSON_LAYOUT_FIELDS_ENV, JSON_LAYOUT_HOST_NAME_ENV,
    JSON_LAYOUT_INCLUDED_FIELDS_ENV, JSON_LAYOUT_RENAMED_FIELDS_ENV, JSON_LAYOUT_TAGS_ENV,
};

/// Static configuration of a [`JsonLayout`](crate::layout::JsonLayout).
///
/// Every option is a plain string in the small list/pair grammar used by
/// logging configuration files:
///
/// - lists separate items with any run of `,` or `;`, e.g. `"a, b;c"`
/// - pairs separate their two halves with any run of `:` or `=`, e.g.
///   `"message:msg"` or `"env = prod"`
///
/// **Fields**
/// - `host_name`: overrides the resolved local host name.
/// - `tags`: list of tags rendered as the `tags` array.
/// - `fields`: list of `name=value` pairs rendered verbatim on every line.
/// - `included_fields`: list of field key prefixes to enable.
/// - `excluded_fields`: list of field key prefixes to disable; applied
///   last, so it wins over `included_fields`.
/// - `renamed_fields`: list of `key:label` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub host_name: Option<String>,
    pub tags: Option<String>,
    pub fields: Option<String>,
    pub included_fields: Option<String>,
    pub excluded_fields: Option<String>,
    #[serde(alias = "renamedFieldLabels")]
    pub renamed_fields: Option<String>,
}

impl LayoutConfig {
    /// Build a config from the `JSON_LAYOUT_*` environment variables.
    /// Unset variables leave the option empty.
    pub fn from_env() -> Self {
        LayoutConfig {
            host_name: env_opt(JSON_LAYOUT_HOST_NAME_ENV),
            tags: env_opt(JSON_LAYOUT_TAGS_ENV),
            fields: env_opt(JSON_LAYOUT_FIELDS_ENV),
            included_fields: env_opt(JSON_LAYOUT_INCLUDED_FIELDS_ENV),
            excluded_fields: env_opt(JSON_LAYOUT_EXCLUDED_FIELDS_ENV),
            renamed_fields: env_opt(JSON_LAYOUT_RENAMED_FIELDS_ENV),
        }
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_included_fields(mut self, included: impl Into<String>) -> Self {
        self.included_fields = Some(included.into());
        self
    }

    pub fn with_excluded_fields(mut self, excluded: impl Into<String>) -> Self {
        self.excluded_fields = Some(excluded.into());
        self
    }

    pub fn with_renamed_fields(mut self, renamed: impl Into<String>) -> Self {
        self.renamed_fields = Some(renamed.into());
        self
    }

    /// Parsed `tags`.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| split_list(tags).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Parsed `fields`, in configured order. A name given twice keeps its
    /// first position and its last value; entries that are not a pair are
    /// skipped.
    pub fn static_fields(&self) -> Vec<(String, String)> {
        let mut parsed: Vec<(String, String)> = Vec::new();
        let Some(fields) = self.fields.as_deref() else {
            return parsed;
        };
        for (name, value) in split_list(fields).filter_map(split_pair) {
            match parsed.iter_mut().find(|(existing, _)| existing == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => parsed.push((name.to_string(), value.to_string())),
            }
        }
        parsed
    }

    /// Parsed `renamed_fields` as `(key, label)` pairs.
    pub fn renames(&self) -> Vec<(&str, &str)> {
        self.renamed_fields
            .as_deref()
            .map(|renamed| split_list(renamed).filter_map(split_pair).collect())
            .unwrap_or_default()
    }

    pub fn included(&self) -> Vec<&str> {
        self.included_fields
            .as_deref()
            .map(|included| split_list(included).collect())
            .unwrap_or_default()
    }

    pub fn excluded(&self) -> Vec<&str> {
        self.excluded_fields
            .as_deref()
            .map(|excluded| split_list(excluded).collect())
            .unwrap_or_default()
    }
}

fn list_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"(?:\s*?[,;]\s*)+").expect("valid list separator"))
}

fn pair_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"(?:\s*?[:=]\s*)+").expect("valid pair separator"))
}

/// Split a list option into trimmed, non-empty items.
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    list_separator()
        .split(value)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// Split a `left:right` / `left=right` pair. Anything other than exactly
/// two non-empty halves yields `None`.
pub fn split_pair(value: &str) -> Option<(&str, &str)> {
    let mut parts = pair_separator().split(value.trim()).map(str::trim);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(right), None) if !left.is_empty() && !right.is_empty() => {
            Some((left, right))
        }
        _ => None,
    }
}
