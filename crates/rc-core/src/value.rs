use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<HostValue>),
    Map(BTreeMap<String, HostValue>),
}

impl HostValue {
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("()"),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Number(value) => {
                if value.fract().abs() < f64::EPSILON {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            }
            Self::String(value) => f.write_str(value),
            Self::Array(_) | Self::Map(_) => write!(f, "{:?}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        assert_eq!(HostValue::String("a".into()).as_string(), Some("a"));
        assert_eq!(HostValue::Number(2.0).as_number(), Some(2.0));
        assert_eq!(HostValue::Bool(true).as_bool(), Some(true));
        assert_eq!(HostValue::Null.as_number(), None);
        assert_eq!(HostValue::Array(Vec::new()).type_name(), "array");
    }

    #[test]
    fn display_trims_integral_numbers() {
        assert_eq!(HostValue::Number(3.0).to_string(), "3");
        assert_eq!(HostValue::Number(1.5).to_string(), "1.5");
        assert_eq!(HostValue::Null.to_string(), "()");
    }

    #[test]
    fn untagged_json_round_trip_keeps_shape() {
        let value: HostValue =
            serde_json::from_str(r#"{"hp":10,"name":"boar","tags":[true,null]}"#)
                .expect("json should parse");
        let HostValue::Map(map) = &value else {
            panic!("expected map");
        };
        assert_eq!(map.get("hp"), Some(&HostValue::Number(10.0)));
        assert_eq!(
            map.get("tags"),
            Some(&HostValue::Array(vec![HostValue::Bool(true), HostValue::Null]))
        );
    }
}
