use anyhow::{bail, Error};
use serde_json::Value;

pub fn required_string_param<'a>(param: &'a Value, name: &str) -> Result<&'a str, Error> {
    match param[name].as_str() {
        Some(s) => Ok(s),
        None => bail!("missing parameter '{}'", name),
    }
}

/// Returns the string parameter, treating empty strings like missing ones
pub fn optional_string_param<'a>(param: &'a Value, name: &str) -> Option<&'a str> {
    param[name].as_str().filter(|s| !s.is_empty())
}

pub fn bool_param(param: &Value, name: &str, default: bool) -> bool {
    param[name].as_bool().unwrap_or(default)
}

pub fn optional_u16_param(param: &Value, name: &str) -> Result<Option<u16>, Error> {
    match &param[name] {
        Value::Null => Ok(None),
        // the CLI layer may hand over numbers as strings
        Value::String(s) => match s.parse::<u16>() {
            Ok(v) => Ok(Some(v)),
            Err(err) => bail!("parameter '{}': unable to parse '{}' - {}", name, s, err),
        },
        value => match value.as_u64() {
            Some(v) if v <= u16::MAX as u64 => Ok(Some(v as u16)),
            _ => bail!("parameter '{}': value out of range", name),
        },
    }
}
