use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::form::date::{DEFAULT_DATE_FORMAT, format_date};

/// Field name → current value.
pub type FormModel = BTreeMap<String, FormValue>;

/// A single form value.
///
/// Mirrors JSON with one addition: `Date`, the parsed form a date-typed
/// component holds while it is being edited.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(NaiveDateTime),
    List(Vec<FormValue>),
    Object(BTreeMap<String, FormValue>),
}

impl FormValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    /// Loose truthiness used by the value pipeline: null, `false`, zero and
    /// the empty string are falsy; lists, objects and dates are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FormValue::Null => false,
            FormValue::Bool(b) => *b,
            FormValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            FormValue::String(s) => !s.is_empty(),
            FormValue::Date(_) | FormValue::List(_) | FormValue::Object(_) => true,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, FormValue::Date(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&NaiveDateTime> {
        match self {
            FormValue::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// JSON rendition. Dates are rendered with the default date format.
    pub fn to_json(&self) -> Value {
        match self {
            FormValue::Null => Value::Null,
            FormValue::Bool(b) => Value::Bool(*b),
            FormValue::Number(n) => Value::Number(n.clone()),
            FormValue::String(s) => Value::String(s.clone()),
            FormValue::Date(d) => Value::String(format_date(d, DEFAULT_DATE_FORMAT)),
            FormValue::List(items) => Value::Array(items.iter().map(FormValue::to_json).collect()),
            FormValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::Number(n),
            Value::String(s) => FormValue::String(s),
            Value::Array(items) => FormValue::List(items.into_iter().map(FormValue::from).collect()),
            Value::Object(map) => {
                FormValue::Object(map.into_iter().map(|(k, v)| (k, FormValue::from(v))).collect())
            }
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<i64> for FormValue {
    fn from(n: i64) -> Self {
        FormValue::Number(n.into())
    }
}

impl From<i32> for FormValue {
    fn from(n: i32) -> Self {
        FormValue::Number(n.into())
    }
}

impl From<f64> for FormValue {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(FormValue::Null, FormValue::Number)
    }
}

impl From<NaiveDateTime> for FormValue {
    fn from(d: NaiveDateTime) -> Self {
        FormValue::Date(d)
    }
}

impl<T: Into<FormValue>> From<Vec<T>> for FormValue {
    fn from(items: Vec<T>) -> Self {
        FormValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FormValue::from)
    }
}

/// Build a `FormModel` from `(key, value)` pairs.
pub fn model<K, V, I>(entries: I) -> FormModel
where
    K: Into<String>,
    V: Into<FormValue>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Convert a JSON object into a `FormModel`. Non-object input yields an empty model.
pub fn model_from_json(value: Value) -> FormModel {
    match value {
        Value::Object(map) => map.into_iter().map(|(k, v)| (k, FormValue::from(v))).collect(),
        _ => FormModel::new(),
    }
}

/// JSON rendition of a whole model.
pub fn model_to_json(model: &FormModel) -> Value {
    Value::Object(
        model
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}
