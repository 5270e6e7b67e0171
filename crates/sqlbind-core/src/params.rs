//! Bound parameter collections

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ParamStyle;

/// Values extracted from the template context, to be passed to the driver
/// alongside the query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    /// Values in bind order (qmark, format, numeric, dollar)
    Positional(Vec<serde_json::Value>),
    /// Values keyed by their generated placeholder key (named, pyformat)
    Named(IndexMap<String, serde_json::Value>),
}

impl Params {
    /// Shape an ordered key/value store into the collection `style` expects.
    pub fn from_bound(style: ParamStyle, bound: IndexMap<String, serde_json::Value>) -> Self {
        if style.is_named() {
            Params::Named(bound)
        } else {
            Params::Positional(bound.into_values().collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the values in bind order, regardless of shape.
    pub fn values(&self) -> Box<dyn Iterator<Item = &serde_json::Value> + '_> {
        match self {
            Params::Positional(values) => Box::new(values.iter()),
            Params::Named(map) => Box::new(map.values()),
        }
    }

    pub fn as_positional(&self) -> Option<&[serde_json::Value]> {
        match self {
            Params::Positional(values) => Some(values),
            Params::Named(_) => None,
        }
    }

    pub fn as_named(&self) -> Option<&IndexMap<String, serde_json::Value>> {
        match self {
            Params::Named(map) => Some(map),
            Params::Positional(_) => None,
        }
    }

    /// Discard keys and return the values in bind order.
    pub fn into_values(self) -> Vec<serde_json::Value> {
        match self {
            Params::Positional(values) => values,
            Params::Named(map) => map.into_values().collect(),
        }
    }
}

/// A rendered query and the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundQuery {
    /// The SQL with every dynamic value replaced by a placeholder
    pub sql: String,
    /// The bound values, shaped by the configured param style
    pub params: Params,
}

impl BoundQuery {
    pub fn into_parts(self) -> (String, Params) {
        (self.sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bound() -> IndexMap<String, serde_json::Value> {
        let mut map = IndexMap::new();
        map.insert("id_1".to_string(), json!(5));
        map.insert("inclause_2".to_string(), json!("a"));
        map
    }

    #[test]
    fn test_positional_shape_keeps_bind_order() {
        let params = Params::from_bound(ParamStyle::Qmark, bound());
        assert_eq!(params.as_positional().unwrap(), &[json!(5), json!("a")]);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_named_shape_keeps_keys() {
        let params = Params::from_bound(ParamStyle::Pyformat, bound());
        let map = params.as_named().unwrap();
        assert_eq!(map.get("id_1"), Some(&json!(5)));
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec!["id_1", "inclause_2"]
        );
        assert_eq!(params.into_values(), vec![json!(5), json!("a")]);
    }

    #[test]
    fn test_serializes_untagged() {
        let positional = Params::from_bound(ParamStyle::Format, bound());
        assert_eq!(serde_json::to_value(&positional).unwrap(), json!([5, "a"]));

        let named = Params::from_bound(ParamStyle::Named, bound());
        assert_eq!(
            serde_json::to_value(&named).unwrap(),
            json!({"id_1": 5, "inclause_2": "a"})
        );
    }

    #[test]
    fn test_empty() {
        let params = Params::from_bound(ParamStyle::Numeric, IndexMap::new());
        assert!(params.is_empty());
        assert_eq!(params.values().count(), 0);
    }
}
