use std::{collections::BTreeMap, path::Path};

use anyhow::{bail, Context as _};
use serde::{Deserialize, Serialize};

use crate::value::{Environment, Value};

/// On-disk spelling of one answer binding. `{ unset = true }` is the
/// explicit placeholder marker a scaffolded answers file starts with.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Unset { unset: bool },
    Bool(bool),
    Number(f64),
    Str(String),
}

pub fn load_answers(path: impl AsRef<Path>) -> anyhow::Result<Environment> {
    let path = path.as_ref();
    let bindings: BTreeMap<String, AnswerValue> = fsutil::read_toml_with_deserialize(path)
        .with_context(|| format!("Cannot load answers file {:?}", path))?;

    let mut env = Environment::new();
    for (name, answer) in bindings {
        let value = match answer {
            AnswerValue::Unset { unset: true } => Value::Unset,
            AnswerValue::Unset { unset: false } => bail!(
                "Invalid answer '{}' in {:?}: `unset = false` makes no sense \
                 (remove the marker or assign a value)",
                name,
                path
            ),
            AnswerValue::Bool(b) => Value::Bool(b),
            AnswerValue::Number(x) => Value::Number(x),
            AnswerValue::Str(s) => Value::Str(s),
        };
        env.bind(name, value);
    }
    Ok(env)
}

#[cfg(test)]
mod test {
    use super::*;

    fn env_from_toml(s: &str) -> Environment {
        let bindings: BTreeMap<String, AnswerValue> = toml::from_str(s).unwrap();
        let mut env = Environment::new();
        for (name, answer) in bindings {
            let value = match answer {
                AnswerValue::Unset { .. } => Value::Unset,
                AnswerValue::Bool(b) => Value::Bool(b),
                AnswerValue::Number(x) => Value::Number(x),
                AnswerValue::Str(s) => Value::Str(s),
            };
            env.bind(name, value);
        }
        env
    }

    #[test]
    fn parse_answer_values() {
        let env = env_from_toml(
            r#"
            p_lt_15 = 0.87895612
            n = 3
            flag = true
            label = "blue"
            untouched = { unset = true }
            "#,
        );
        assert_eq!(env.get("p_lt_15"), Some(&Value::Number(0.87895612)));
        assert_eq!(env.get("n"), Some(&Value::Number(3.0)));
        assert_eq!(env.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(env.get("label"), Some(&Value::Str("blue".into())));
        assert_eq!(env.get("untouched"), Some(&Value::Unset));
        assert!(!env.defines("missing"));
    }

    #[test]
    fn example_answers_template_parses_to_unset_placeholder() {
        let env = env_from_toml(&crate::Config::example_answers_toml());
        assert_eq!(env.get("p_lt_15"), Some(&Value::Unset));
    }
}
