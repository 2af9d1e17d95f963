/// Environment variable names read by [`LayoutConfig::from_env`].
///
/// These are purely helpers; the layout itself never touches the
/// environment.
///
/// [`LayoutConfig::from_env`]: crate::config::LayoutConfig::from_env

/// Host name override for the `host` field.
pub const JSON_LAYOUT_HOST_NAME_ENV: &str = "JSON_LAYOUT_HOST_NAME";

/// Tag list, e.g. `api,blue`.
pub const JSON_LAYOUT_TAGS_ENV: &str = "JSON_LAYOUT_TAGS";

/// Static `name=value` pairs added to every line.
pub const JSON_LAYOUT_FIELDS_ENV: &str = "JSON_LAYOUT_FIELDS";

/// Field key prefixes to enable, e.g. `location`.
pub const JSON_LAYOUT_INCLUDED_FIELDS_ENV: &str = "JSON_LAYOUT_INCLUDED_FIELDS";

/// Field key prefixes to disable.
pub const JSON_LAYOUT_EXCLUDED_FIELDS_ENV: &str = "JSON_LAYOUT_EXCLUDED_FIELDS";

/// `key:label` rename pairs.
pub const JSON_LAYOUT_RENAMED_FIELDS_ENV: &str = "JSON_LAYOUT_RENAMED_FIELDS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable, treating unset and empty alike.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
