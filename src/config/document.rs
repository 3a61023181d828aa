use super::ConfigError;
use crate::models::ConfigValue;
use indexmap::IndexMap;
use serde_yaml_ng::Value as YamlValue;

/// In-memory tree of one YAML file.
///
/// Structure only changes through [`ConfigDocument::set`], which creates
/// missing intermediate mappings but never replaces a scalar with a mapping
/// (or a mapping with a scalar).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: IndexMap<String, ConfigValue>,
}

/// Split `Section.Subsection.Key` into its segments.
///
/// Segments are case-sensitive and dots cannot be escaped.
pub fn split_path(path: &str) -> Result<Vec<&str>, ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ConfigError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML text. An empty file yields an empty document.
    pub fn parse(text: &str) -> Result<Self, serde_yaml_ng::Error> {
        let value: YamlValue = serde_yaml_ng::from_str(text)?;
        Ok(match ConfigValue::from(value) {
            ConfigValue::Mapping(root) => Self { root },
            ConfigValue::Null => Self::default(),
            other => {
                // A bare scalar or list at the top level has no addressable keys
                tracing::warn!("YAML document root is a {}, treating as empty", other.kind());
                Self::default()
            }
        })
    }

    /// Convert back into a `serde_yaml_ng` tree, keeping key order.
    pub fn to_value(&self) -> YamlValue {
        let root: serde_yaml_ng::Mapping = self
            .root
            .iter()
            .map(|(k, v)| (YamlValue::String(k.clone()), YamlValue::from(v)))
            .collect();
        YamlValue::Mapping(root)
    }

    pub fn to_yaml_string(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(&self.to_value())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Look up the node at `path`.
    ///
    /// Missing segments, null leaves and scalars standing where a mapping is
    /// expected all read as absent. The document is never modified.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        let segments = split_path(path).ok()?;
        let (last, parents) = segments.split_last()?;

        let mut current = &self.root;
        for segment in parents {
            match current.get(*segment) {
                Some(ConfigValue::Mapping(next)) => current = next,
                Some(ConfigValue::Null) | None => return None,
                Some(other) => {
                    tracing::debug!(
                        "Path {} crosses a {} at segment '{}'",
                        path,
                        other.kind(),
                        segment
                    );
                    return None;
                }
            }
        }

        current.get(*last).filter(|value| !value.is_null())
    }

    /// Store `value` at `path`, creating intermediate mappings as needed.
    ///
    /// Returns `true` when the document changed.
    pub fn set(&mut self, path: &str, value: ConfigValue) -> Result<bool, ConfigError> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(ConfigError::InvalidPath(path.to_string()));
        };

        let mut current = &mut self.root;
        for segment in parents {
            let node = current
                .entry(segment.to_string())
                .or_insert_with(ConfigValue::empty_mapping);
            if node.is_null() {
                *node = ConfigValue::empty_mapping();
            }
            current = match node {
                ConfigValue::Mapping(next) => next,
                other => {
                    return Err(ConfigError::PathConflict {
                        path: path.to_string(),
                        segment: segment.to_string(),
                        found: other.kind(),
                    });
                }
            };
        }

        match current.get(*last) {
            Some(existing) if *existing == value => return Ok(false),
            Some(existing)
                if !existing.is_null() && existing.is_mapping() != value.is_mapping() =>
            {
                return Err(ConfigError::PathConflict {
                    path: path.to_string(),
                    segment: last.to_string(),
                    found: existing.kind(),
                });
            }
            _ => {}
        }

        current.insert(last.to_string(), value);
        Ok(true)
    }
}
