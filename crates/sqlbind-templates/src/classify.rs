//! Value classification at the bind boundary

use minijinja::Value;
use minijinja::value::ValueKind;

/// The shape of a value reaching a binding filter, decided once and then
/// matched exhaustively by the binder.
#[derive(Debug, Clone)]
pub enum BindValue {
    /// Pre-formatted SQL text (`sqlsafe`, `identifier`, macro output, placeholders)
    Safe(Value),
    /// A list, tuple or other iterable
    Sequence(Value),
    /// A mapping, which has no scalar SQL representation
    Mapping(Value),
    /// Anything that can be sent to the driver as a single parameter
    Scalar(Value),
}

impl BindValue {
    pub fn classify(value: Value) -> Self {
        if value.is_safe() {
            return BindValue::Safe(value);
        }
        match value.kind() {
            ValueKind::Seq | ValueKind::Iterable => BindValue::Sequence(value),
            ValueKind::Map => BindValue::Mapping(value),
            _ => BindValue::Scalar(value),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            BindValue::Safe(_) => "safe string",
            BindValue::Sequence(_) => "sequence",
            BindValue::Mapping(_) => "mapping",
            BindValue::Scalar(_) => "scalar",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_classify_safe() {
        let value = Value::from_safe_string("\"users\"".to_string());
        assert!(matches!(BindValue::classify(value), BindValue::Safe(_)));
    }

    #[test]
    fn test_classify_sequences() {
        assert!(matches!(
            BindValue::classify(Value::from(vec![1, 2, 3])),
            BindValue::Sequence(_)
        ));
        assert!(matches!(
            BindValue::classify(Value::from_serialize(("public", "users"))),
            BindValue::Sequence(_)
        ));
    }

    #[test]
    fn test_classify_mapping() {
        let mut map = BTreeMap::new();
        map.insert("id", 1);
        assert!(matches!(
            BindValue::classify(Value::from_serialize(&map)),
            BindValue::Mapping(_)
        ));
    }

    #[test]
    fn test_classify_scalars() {
        for value in [
            Value::from(5),
            Value::from(1.5),
            Value::from(true),
            Value::from("it's"),
            Value::from(()),
            Value::UNDEFINED,
        ] {
            let classified = BindValue::classify(value);
            assert_eq!(classified.kind_name(), "scalar");
        }
    }
}
