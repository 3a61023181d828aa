use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde_yaml_ng::Value as YamlValue;

/// A node of a loaded YAML document.
///
/// Leaf values keep their native YAML scalar type. Reads go through
/// [`FromConfigValue`], which is total: a value that cannot be coerced to the
/// requested type yields `None` instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(IndexMap<String, ConfigValue>),
}

impl ConfigValue {
    /// An empty mapping node, used when a dotted path creates intermediates.
    pub fn empty_mapping() -> Self {
        ConfigValue::Mapping(IndexMap::new())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ConfigValue::Mapping(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Short type name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Sequence(_) => "sequence",
            ConfigValue::Mapping(_) => "mapping",
        }
    }

    /// Render a scalar the way it would appear in the YAML file.
    fn scalar_text(&self) -> Option<String> {
        match self {
            ConfigValue::Bool(b) => Some(b.to_string()),
            ConfigValue::Integer(i) => Some(i.to_string()),
            ConfigValue::Float(f) => Some(f.to_string()),
            ConfigValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

fn key_text(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "~".to_string(),
        other => serde_yaml_ng::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl From<YamlValue> for ConfigValue {
    fn from(value: YamlValue) -> Self {
        match value {
            YamlValue::Null => ConfigValue::Null,
            YamlValue::Bool(b) => ConfigValue::Bool(b),
            YamlValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    ConfigValue::Float(f)
                } else {
                    ConfigValue::String(n.to_string())
                }
            }
            YamlValue::String(s) => ConfigValue::String(s),
            YamlValue::Sequence(seq) => {
                ConfigValue::Sequence(seq.into_iter().map(ConfigValue::from).collect())
            }
            YamlValue::Mapping(map) => ConfigValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (key_text(&k), ConfigValue::from(v)))
                    .collect(),
            ),
            YamlValue::Tagged(tagged) => ConfigValue::from(tagged.value),
        }
    }
}

impl From<&ConfigValue> for YamlValue {
    fn from(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Null => YamlValue::Null,
            ConfigValue::Bool(b) => YamlValue::Bool(*b),
            ConfigValue::Integer(i) => YamlValue::Number((*i).into()),
            ConfigValue::Float(f) => YamlValue::Number((*f).into()),
            ConfigValue::String(s) => YamlValue::String(s.clone()),
            ConfigValue::Sequence(seq) => {
                YamlValue::Sequence(seq.iter().map(YamlValue::from).collect())
            }
            ConfigValue::Mapping(map) => YamlValue::Mapping(
                map.iter()
                    .map(|(k, v)| (YamlValue::String(k.clone()), YamlValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Integer(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<Utf8PathBuf> for ConfigValue {
    fn from(value: Utf8PathBuf) -> Self {
        ConfigValue::String(value.into_string())
    }
}

impl From<&Utf8PathBuf> for ConfigValue {
    fn from(value: &Utf8PathBuf) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        ConfigValue::Sequence(value.into_iter().map(ConfigValue::String).collect())
    }
}

impl From<IndexMap<String, String>> for ConfigValue {
    fn from(value: IndexMap<String, String>) -> Self {
        ConfigValue::Mapping(
            value
                .into_iter()
                .map(|(k, v)| (k, ConfigValue::String(v)))
                .collect(),
        )
    }
}

/// Total coercion from a stored node to a caller-requested type.
pub trait FromConfigValue: Sized {
    fn from_config_value(value: &ConfigValue) -> Option<Self>;
}

impl FromConfigValue for ConfigValue {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromConfigValue for String {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        value.scalar_text()
    }
}

impl FromConfigValue for bool {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            ConfigValue::Integer(0) => Some(false),
            ConfigValue::Integer(1) => Some(true),
            _ => None,
        }
    }
}

impl FromConfigValue for i64 {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Integer(i) => Some(*i),
            // Half-open: i64::MAX rounds up to 2^63 as f64
            ConfigValue::Float(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) => {
                Some(*f as i64)
            }
            ConfigValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromConfigValue for u32 {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        i64::from_config_value(value).and_then(|i| u32::try_from(i).ok())
    }
}

impl FromConfigValue for f64 {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f64),
            ConfigValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromConfigValue for Utf8PathBuf {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::String(s) if !s.trim().is_empty() => Some(Utf8PathBuf::from(s.trim())),
            _ => None,
        }
    }
}

/// Sequences of scalars, or a comma separated string (`"critical,error,failed"`).
impl FromConfigValue for Vec<String> {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Sequence(seq) => seq.iter().map(ConfigValue::scalar_text).collect(),
            ConfigValue::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl FromConfigValue for IndexMap<String, String> {
    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        value.as_mapping().and_then(|map| {
            map.iter()
                .map(|(k, v)| v.scalar_text().map(|text| (k.clone(), text)))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_conversion_keeps_scalar_types() {
        let yaml: YamlValue =
            serde_yaml_ng::from_str("a: 1\nb: true\nc: text\nd: 1.5\ne:\nf: [x, y]").unwrap();
        let value = ConfigValue::from(yaml);
        let map = value.as_mapping().unwrap();

        assert_eq!(map["a"], ConfigValue::Integer(1));
        assert_eq!(map["b"], ConfigValue::Bool(true));
        assert_eq!(map["c"], ConfigValue::String("text".to_string()));
        assert_eq!(map["d"], ConfigValue::Float(1.5));
        assert!(map["e"].is_null());
        assert_eq!(map["f"].kind(), "sequence");
    }

    #[test]
    fn test_numeric_keys_become_strings() {
        let yaml: YamlValue = serde_yaml_ng::from_str("377160: Fallout4").unwrap();
        let value = ConfigValue::from(yaml);
        assert!(value.as_mapping().unwrap().contains_key("377160"));
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(bool::from_config_value(&ConfigValue::Bool(true)), Some(true));
        assert_eq!(bool::from_config_value(&"False".into()), Some(false));
        assert_eq!(bool::from_config_value(&"maybe".into()), None);
        assert_eq!(bool::from_config_value(&ConfigValue::empty_mapping()), None);
    }

    #[test]
    fn test_string_coercion_from_scalars() {
        assert_eq!(
            String::from_config_value(&ConfigValue::Integer(7)),
            Some("7".to_string())
        );
        assert_eq!(
            String::from_config_value(&ConfigValue::Bool(false)),
            Some("false".to_string())
        );
        assert_eq!(String::from_config_value(&ConfigValue::Null), None);
        assert_eq!(String::from_config_value(&ConfigValue::empty_mapping()), None);
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(i64::from_config_value(&" 42 ".into()), Some(42));
        assert_eq!(i64::from_config_value(&ConfigValue::Float(3.0)), Some(3));
        assert_eq!(i64::from_config_value(&ConfigValue::Float(3.5)), None);
        assert_eq!(u32::from_config_value(&ConfigValue::Integer(-1)), None);
    }

    #[test]
    fn test_out_of_range_float_is_not_an_integer() {
        assert_eq!(i64::from_config_value(&ConfigValue::Float(1e300)), None);
        assert_eq!(i64::from_config_value(&ConfigValue::Float(-1e300)), None);
        assert_eq!(i64::from_config_value(&ConfigValue::Float(9.3e18)), None);
        assert_eq!(i64::from_config_value(&ConfigValue::Float(f64::INFINITY)), None);
        assert_eq!(i64::from_config_value(&ConfigValue::Float(-9.0e18)), Some(-9_000_000_000_000_000_000));
    }

    #[test]
    fn test_list_coercion_accepts_comma_string() {
        let list = Vec::<String>::from_config_value(&"critical, error,,failed".into()).unwrap();
        assert_eq!(list, vec!["critical", "error", "failed"]);
    }

    #[test]
    fn test_path_coercion_rejects_blank() {
        assert_eq!(Utf8PathBuf::from_config_value(&"   ".into()), None);
        assert_eq!(
            Utf8PathBuf::from_config_value(&"C:/Games".into()),
            Some(Utf8PathBuf::from("C:/Games"))
        );
    }
}
