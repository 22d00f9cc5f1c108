use std::collections::HashMap;

use crate::argument::Action;
use crate::error::Error;
use crate::tokens;

/// The result of one parse: a mapping from destination key to the action
/// tag and the ordered raw string values.
///
/// Lookup first tries the exact key, then compares against stored keys with
/// their prefix characters stripped, so `namespace.values("verbose")` finds
/// an argument stored under `--verbose`. Typed coercion is left to the
/// caller; the namespace only hands back strings plus the action tag.
#[derive(Debug)]
pub struct Namespace {
    entries: HashMap<String, (Action, Vec<String>)>,
    prefix_chars: String,
}

impl Namespace {
    pub(crate) fn new(entries: HashMap<String, (Action, Vec<String>)>, prefix_chars: String) -> Self {
        Self {
            entries,
            prefix_chars,
        }
    }

    pub(crate) fn into_entries(self) -> HashMap<String, (Action, Vec<String>)> {
        self.entries
    }

    fn data(&self, key: &str) -> Result<&(Action, Vec<String>), Error> {
        if let Some(entry) = self.entries.get(key) {
            return Ok(entry);
        }
        for (stored, entry) in &self.entries {
            if tokens::is_option_token(stored, &self.prefix_chars)
                && tokens::flag_name(stored) == key
            {
                return Ok(entry);
            }
        }
        Err(Error::Attribute(format!(
            "'Namespace' object has no attribute '{key}'"
        )))
    }

    /// Whether the key names a parsed argument.
    pub fn exists(&self, key: &str) -> bool {
        self.data(key).is_ok()
    }

    /// The action tag recorded for the key.
    pub fn action(&self, key: &str) -> Result<Action, Error> {
        self.data(key).map(|(action, _)| *action)
    }

    /// The ordered raw string values recorded for the key.
    pub fn values(&self, key: &str) -> Result<&[String], Error> {
        self.data(key).map(|(_, values)| values.as_slice())
    }

    /// Render the key's value as a display string.
    ///
    /// `store_const` yields its single value, `store_true`/`store_false`
    /// yield `"true"`/`"false"`, `count` yields the decimal count, and the
    /// sequence-bearing actions yield `[v1, v2, …]` with empty strings
    /// rendered as `None`.
    pub fn to_string(&self, key: &str) -> Result<String, Error> {
        let (action, values) = self.data(key)?;
        match action {
            Action::StoreConst => Ok(single(values, key)?.to_string()),
            Action::StoreTrue | Action::StoreFalse => {
                let value = single(values, key)?;
                Ok(if value == "0" { "false" } else { "true" }.to_string())
            }
            Action::Count => Ok(values.len().to_string()),
            Action::Store | Action::Append | Action::AppendConst | Action::Extend => {
                let rendered: Vec<&str> = values
                    .iter()
                    .map(|value| if value.is_empty() { "None" } else { value.as_str() })
                    .collect();
                Ok(format!("[{}]", tokens::join_all(rendered, ", ", "")))
            }
            Action::Help | Action::Version => {
                Err(Error::Value("action not supported".to_string()))
            }
        }
    }
}

fn single<'a>(values: &'a [String], key: &str) -> Result<&'a str, Error> {
    match values {
        [value] => Ok(value),
        _ => Err(Error::Type(format!(
            "trying to get data from array argument '{key}'"
        ))),
    }
}
