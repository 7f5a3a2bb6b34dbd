//! @ai:module:intent Immutable description of one toolchain stage and its default overrides
//! @ai:module:layer domain
//! @ai:module:public_api ToolSpec, ArgValue, EnvValue, render_args
//! @ai:module:stateless true

use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::ordered::OrderedMap;
use crate::tool::extractor::FieldExtractor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// @ai:intent Typed argument value, parsed once at the configuration boundary
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ArgValue {
    /// Rendered as the bare key
    Flag,
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl ArgValue {
    /// @ai:intent Render one command-line argument for this value
    /// @ai:effects pure
    pub fn render(&self, key: &str) -> String {
        match self {
            ArgValue::Flag => key.to_string(),
            ArgValue::Text(text) => format!("{key}=\"{text}\""),
            ArgValue::Number(number) => format!("{key}={number}"),
            ArgValue::Bool(true) => format!("{key}=True"),
            ArgValue::Bool(false) => format!("{key}=False"),
        }
    }
}

impl TryFrom<Value> for ArgValue {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(ArgValue::Flag),
            Value::String(text) => Ok(ArgValue::Text(text)),
            Value::Number(number) => Ok(ArgValue::Number(number)),
            Value::Bool(flag) => Ok(ArgValue::Bool(flag)),
            other => Err(format!(
                "unsupported argument value {other}; expected null, string, number or boolean"
            )),
        }
    }
}

impl From<ArgValue> for Value {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Flag => Value::Null,
            ArgValue::Text(text) => Value::String(text),
            ArgValue::Number(number) => Value::Number(number),
            ArgValue::Bool(flag) => Value::Bool(flag),
        }
    }
}

/// @ai:intent Environment variable default: set to a value, or removed from the child
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum EnvValue {
    Set(String),
    Unset,
}

impl TryFrom<Value> for EnvValue {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(EnvValue::Unset),
            Value::String(text) => Ok(EnvValue::Set(text)),
            Value::Number(number) => Ok(EnvValue::Set(number.to_string())),
            Value::Bool(flag) => Ok(EnvValue::Set(flag.to_string())),
            other => Err(format!(
                "unsupported environment value {other}; expected null, string, number or boolean"
            )),
        }
    }
}

impl From<EnvValue> for Value {
    fn from(value: EnvValue) -> Self {
        match value {
            EnvValue::Set(text) => Value::String(text),
            EnvValue::Unset => Value::Null,
        }
    }
}

/// @ai:intent One stage of the toolchain: command, defaults and metric patterns
#[derive(Debug, Clone)]
pub struct ToolSpec {
    command: String,
    default_env: BTreeMap<String, EnvValue>,
    default_args: OrderedMap<ArgValue>,
    fields: FieldExtractor,
}

impl ToolSpec {
    /// @ai:intent Create a tool spec from already-validated parts
    /// @ai:effects pure
    pub fn new(
        command: impl Into<String>,
        default_env: BTreeMap<String, EnvValue>,
        default_args: OrderedMap<ArgValue>,
        fields: FieldExtractor,
    ) -> Self {
        Self {
            command: command.into(),
            default_env,
            default_args,
            fields,
        }
    }

    /// @ai:intent Build a tool spec from its configuration entry, compiling field patterns
    /// @ai:pre config.tool is non-empty
    /// @ai:effects pure
    pub fn from_config(config: &ToolConfig) -> Result<Self> {
        if config.tool.trim().is_empty() {
            return Err(Error::config("tool command must not be empty"));
        }
        let fields = FieldExtractor::compile(&config.greps)?;
        Ok(Self::new(
            config.tool.clone(),
            config.envs.clone(),
            config.args.clone(),
            fields,
        ))
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn default_env(&self) -> &BTreeMap<String, EnvValue> {
        &self.default_env
    }

    pub fn default_args(&self) -> &OrderedMap<ArgValue> {
        &self.default_args
    }

    pub fn fields(&self) -> &FieldExtractor {
        &self.fields
    }

    /// @ai:intent Field names in declaration order
    /// @ai:effects pure
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.names()
    }

    /// @ai:intent Defaults overlaid by per-task environment overrides
    /// @ai:effects pure
    pub fn effective_env(&self, overrides: &[(String, String)]) -> BTreeMap<String, EnvValue> {
        let mut env = self.default_env.clone();
        for (key, value) in overrides {
            env.insert(key.clone(), EnvValue::Set(value.clone()));
        }
        env
    }

    /// @ai:intent Defaults overlaid by per-task argument overrides; cell text renders as Text
    /// @ai:post overridden keys keep their default position, new keys append in column order
    /// @ai:effects pure
    pub fn effective_args(&self, overrides: &[(String, String)]) -> OrderedMap<ArgValue> {
        let mut args = self.default_args.clone();
        args.extend(
            overrides
                .iter()
                .map(|(key, value)| (key.clone(), ArgValue::Text(value.clone()))),
        );
        args
    }

    /// @ai:intent Pull every declared field out of captured standard output
    /// @ai:effects pure
    pub fn extract(&self, stdout: &str) -> Result<OrderedMap<String>> {
        self.fields.extract(stdout)
    }
}

/// @ai:intent Render an argument map into the process argument list, in map order
/// @ai:effects pure
pub fn render_args(args: &OrderedMap<ArgValue>) -> Vec<String> {
    args.iter().map(|(key, value)| value.render(key)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec_with_defaults() -> ToolSpec {
        let env = BTreeMap::from([
            ("OMP_NUM_THREADS".to_string(), EnvValue::Set("1".to_string())),
            ("MODE".to_string(), EnvValue::Set("fast".to_string())),
        ]);
        let args: OrderedMap<ArgValue> = serde_json::from_str(
            r#"{"--size": 100, "--name": "run", "--verbose": null, "--check": true}"#,
        )
        .unwrap();
        ToolSpec::new("bench", env, args, FieldExtractor::default())
    }

    #[test]
    fn test_arg_value_parsing() {
        let args: OrderedMap<ArgValue> =
            serde_json::from_str(r#"{"a": null, "b": "x", "c": 1.5, "d": false}"#).unwrap();
        assert_eq!(args.get("a"), Some(&ArgValue::Flag));
        assert_eq!(args.get("b"), Some(&ArgValue::Text("x".to_string())));
        assert_eq!(args.get("c").unwrap().render("c"), "c=1.5");
        assert_eq!(args.get("d"), Some(&ArgValue::Bool(false)));
    }

    #[test]
    fn test_arg_value_rejects_arrays() {
        let result = serde_json::from_str::<OrderedMap<ArgValue>>(r#"{"a": [1, 2]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_value_accepts_scalars() {
        let env: BTreeMap<String, EnvValue> =
            serde_json::from_str(r#"{"A": "x", "B": 4, "C": null}"#).unwrap();
        assert_eq!(env["A"], EnvValue::Set("x".to_string()));
        assert_eq!(env["B"], EnvValue::Set("4".to_string()));
        assert_eq!(env["C"], EnvValue::Unset);
    }

    #[test]
    fn test_render_args_by_variant() {
        let spec = spec_with_defaults();
        assert_eq!(
            render_args(spec.default_args()),
            vec!["--size=100", "--name=\"run\"", "--verbose", "--check=True"]
        );
    }

    #[test]
    fn test_bool_renders_capitalized() {
        assert_eq!(ArgValue::Bool(true).render("--check"), "--check=True");
        assert_eq!(ArgValue::Bool(false).render("--check"), "--check=False");
    }

    #[test]
    fn test_override_wins_and_defaults_survive() {
        let spec = spec_with_defaults();
        let overrides = vec![
            ("--size".to_string(), "200".to_string()),
            ("--extra".to_string(), "on".to_string()),
        ];
        let args = spec.effective_args(&overrides);

        for (key, default) in spec.default_args().iter() {
            let expected = overrides
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| ArgValue::Text(v.clone()))
                .unwrap_or_else(|| default.clone());
            assert_eq!(args.get(key), Some(&expected));
        }
        assert_eq!(
            render_args(&args),
            vec![
                "--size=\"200\"",
                "--name=\"run\"",
                "--verbose",
                "--check=True",
                "--extra=\"on\""
            ]
        );
    }

    #[test]
    fn test_env_override_wins() {
        let spec = spec_with_defaults();
        let env = spec.effective_env(&[("OMP_NUM_THREADS".to_string(), "8".to_string())]);
        assert_eq!(env["OMP_NUM_THREADS"], EnvValue::Set("8".to_string()));
        assert_eq!(env["MODE"], EnvValue::Set("fast".to_string()));
    }

    #[test]
    fn test_from_config_rejects_empty_command() {
        let config = ToolConfig {
            tool: "  ".to_string(),
            envs: BTreeMap::new(),
            args: OrderedMap::new(),
            greps: OrderedMap::new(),
        };
        assert!(matches!(ToolSpec::from_config(&config), Err(Error::Config(_))));
    }
}
