//! Host configuration surface.
//!
//! [`Options`] is the engine's view of the host element's configuration: a
//! flat map of `section-key` strings such as `grid-density` or
//! `ripple-duration`. It is read once at setup. Lookups are lenient: a
//! malformed value is logged and treated as absent so callers fall back to
//! their documented default.
//!
//! A TOML document can be flattened into the same shape:
//!
//! ```toml
//! [grid]
//! density = 3
//! effect = ["ripple", "repulsion"]
//!
//! [[grid.breakpoints]]
//! max_width = 600
//! size_scale = 0.85
//! density_scale = 0.925
//!
//! [ripple]
//! duration = 0.8
//! affect = "opacity size"
//! ```

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::grid::Breakpoint;

/// Key that marks a host as a particle-grid host.
pub const GRID_ENABLED_KEY: &str = "grid-bg";

/// Flat, lenient key/value configuration for one grid host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: BTreeMap<String, String>,
    breakpoints: Option<Vec<Breakpoint>>,
}

impl Options {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from `(key, value)` pairs, e.g. a host's data attributes.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            breakpoints: None,
        }
    }

    /// Parses a TOML document and flattens `[section] key = value` entries
    /// into `section-key` options. Underscores in keys become hyphens.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is not valid TOML, if the
    /// `grid.breakpoints` table is malformed, or if a value is a nested table
    /// or datetime.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let table: toml::Table = source.parse()?;
        let mut options = Self::new();

        for (section, value) in table {
            match value {
                toml::Value::Table(entries) => {
                    for (key, value) in entries {
                        if section == "grid" && key == "breakpoints" {
                            options.breakpoints = Some(parse_breakpoints(value)?);
                            continue;
                        }
                        let flat = format!("{section}-{}", key.replace('_', "-"));
                        let text = flatten_value(&flat, &value)?;
                        options.values.insert(flat, text);
                    }
                }
                other => {
                    let flat = section.replace('_', "-");
                    let text = flatten_value(&flat, &other)?;
                    options.values.insert(flat, text);
                }
            }
        }

        Ok(options)
    }

    /// Sets an option, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets an option.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw string value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns true if the option is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Numeric value, or `None` if absent, non-numeric or non-finite.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f32> {
        let raw = self.get(key)?;
        match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                tracing::warn!("ignoring malformed numeric option {}={:?}", key, raw);
                None
            }
        }
    }

    /// Numeric value with a fallback.
    #[must_use]
    pub fn number_or(&self, key: &str, default: f32) -> f32 {
        self.number(key).unwrap_or(default)
    }

    /// Numeric value accepted only if `accept` holds, otherwise `default`.
    #[must_use]
    pub fn number_where(&self, key: &str, default: f32, accept: impl Fn(f32) -> bool) -> f32 {
        match self.number(key) {
            Some(value) if accept(value) => value,
            Some(value) => {
                tracing::warn!("option {}={} out of range, using {}", key, value, default);
                default
            }
            None => default,
        }
    }

    /// Whitespace-separated words of an option (empty if absent).
    pub fn words<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.get(key).unwrap_or_default().split_whitespace()
    }

    /// Boolean flag: `true`, `1`, `yes` or `on` (case-insensitive).
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|raw| {
            matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        })
    }

    /// Returns true if these options mark a particle-grid host.
    #[must_use]
    pub fn is_grid_host(&self) -> bool {
        self.flag(GRID_ENABLED_KEY)
    }

    /// Breakpoint table supplied by a config document, if any.
    #[must_use]
    pub fn breakpoints(&self) -> Option<&[Breakpoint]> {
        self.breakpoints.as_deref()
    }
}

fn flatten_value(key: &str, value: &toml::Value) -> ConfigResult<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Array(items) => {
            let words = items
                .iter()
                .map(|item| match item {
                    toml::Value::Array(_) | toml::Value::Table(_) => {
                        Err(ConfigError::UnsupportedValue { key: key.to_owned() })
                    }
                    scalar => flatten_value(key, scalar),
                })
                .collect::<ConfigResult<Vec<_>>>()?;
            Ok(words.join(" "))
        }
        toml::Value::Table(_) | toml::Value::Datetime(_) => {
            Err(ConfigError::UnsupportedValue { key: key.to_owned() })
        }
    }
}

fn parse_breakpoints(value: toml::Value) -> ConfigResult<Vec<Breakpoint>> {
    let mut table = value.try_into::<Vec<Breakpoint>>().map_err(|e: toml::de::Error| {
        ConfigError::Breakpoints {
            reason: e.to_string(),
        }
    })?;

    if let Some(bad) = table
        .iter()
        .find(|b| !(b.max_width > 0.0 && b.size_scale > 0.0 && b.density_scale > 0.0))
    {
        return Err(ConfigError::Breakpoints {
            reason: format!("non-positive entry at max_width {}", bad.max_width),
        });
    }

    table.sort_by(|a, b| a.max_width.total_cmp(&b.max_width));
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_number_falls_back() {
        let options = Options::from_pairs([("ripple-duration", "fast"), ("ripple-amplitude", "20")]);
        assert_eq!(options.number_or("ripple-duration", 1.2), 1.2);
        assert_eq!(options.number_or("ripple-amplitude", 15.0), 20.0);
        assert_eq!(options.number_or("ripple-thickness", 0.15), 0.15);
    }

    #[test]
    fn test_number_where_rejects_out_of_range() {
        let options = Options::from_pairs([("repulsion-friction", "1.5")]);
        let friction = options.number_where("repulsion-friction", 0.85, |f| f > 0.0 && f < 1.0);
        assert_eq!(friction, 0.85);
    }

    #[test]
    fn test_words_and_flag() {
        let options = Options::new()
            .with("grid-bg", "true")
            .with("grid-effect", "ripple  repulsion");
        assert!(options.is_grid_host());
        assert_eq!(options.words("grid-effect").collect::<Vec<_>>(), ["ripple", "repulsion"]);
        assert_eq!(options.words("missing").count(), 0);
    }

    #[test]
    fn test_toml_flattening() {
        let options = Options::from_toml_str(
            r#"
            [grid]
            bg = true
            density = 3
            effect = ["ripple", "repulsion"]

            [repulsion]
            max_force = 4.5

            [[grid.breakpoints]]
            max_width = 900
            size_scale = 0.9
            density_scale = 0.95

            [[grid.breakpoints]]
            max_width = 400
            size_scale = 0.8
            density_scale = 0.9
            "#,
        )
        .unwrap();

        assert!(options.is_grid_host());
        assert_eq!(options.number("grid-density"), Some(3.0));
        assert_eq!(options.get("grid-effect"), Some("ripple repulsion"));
        assert_eq!(options.number("repulsion-max-force"), Some(4.5));

        let breakpoints = options.breakpoints().unwrap();
        assert_eq!(breakpoints.len(), 2);
        assert_eq!(breakpoints[0].max_width, 400.0);
    }

    #[test]
    fn test_toml_syntax_error() {
        let err = Options::from_toml_str("[grid\ndensity = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax(_)));
    }

    #[test]
    fn test_toml_bad_breakpoints() {
        let err = Options::from_toml_str(
            "[[grid.breakpoints]]\nmax_width = 400\nsize_scale = 0\ndensity_scale = 1",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Breakpoints { .. }));
    }
}
