use clap::ValueEnum;
use pdp_setup_config::ConfigValue;

/// How `set` interprets its VALUE argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    String,
    Int,
    Bool,
    /// Comma separated, written as a YAML sequence.
    List,
}

pub fn parse_value(raw: &str, value_type: ValueType) -> Result<ConfigValue, String> {
    match value_type {
        ValueType::String => Ok(ConfigValue::from(raw)),
        ValueType::Int => raw
            .trim()
            .parse::<i64>()
            .map(ConfigValue::Integer)
            .map_err(|e| format!("'{raw}' is not an integer: {e}")),
        ValueType::Bool => ConfigValue::from(raw)
            .as_bool()
            .map(ConfigValue::Bool)
            .ok_or_else(|| format!("'{raw}' is not true or false")),
        ValueType::List => Ok(ConfigValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_values() {
        assert_eq!(parse_value("8443", ValueType::Int), Ok(ConfigValue::Integer(8443)));
        assert_eq!(parse_value("TRUE", ValueType::Bool), Ok(ConfigValue::Bool(true)));
        assert_eq!(
            parse_value("TLSv1.3, TLSv1.2,", ValueType::List),
            Ok(ConfigValue::from(vec!["TLSv1.3", "TLSv1.2"]))
        );
        assert_eq!(parse_value("8443", ValueType::String), Ok(ConfigValue::from("8443")));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_value("eighty", ValueType::Int).is_err());
        assert!(parse_value("yes", ValueType::Bool).is_err());
    }
}
