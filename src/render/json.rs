//! JSON rendering.

use serde::Serialize;

/// Pretty-print a serializable value. Key order follows insertion order.
pub fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_preserves_insertion_order() {
        let value = json!({"zulu": 1, "alpha": 2});
        let rendered = pretty(&value);
        let zulu = rendered.find("zulu").unwrap();
        let alpha = rendered.find("alpha").unwrap();
        assert!(zulu < alpha);
    }
}
