use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::Error;

/// Mutable key/value state shared by every task in one pipeline run.
///
/// There is no schema: tasks add keys as they go. A later task may only rely on a
/// key if an earlier task is guaranteed to have written it, since the pipeline
/// orders tasks by registration and nothing else.
#[derive(Debug, Default, Clone)]
pub struct Context {
    values: FxHashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value if there was one.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        let key = key.into();
        log::trace!("context: setting {key}");
        self.values.insert(key, value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get `key` if it is set and holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Like `get_str`, but a missing or non-string value is an error.
    pub fn require_str(&self, key: &str) -> Result<&str, Error> {
        match self.values.get(key) {
            None => Err(Error::MissingKey(key.to_owned())),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(Error::NotAString(key.to_owned())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());
        assert!(ctx.insert("profileId", "00e123").is_none());
        assert_eq!(ctx.get_str("profileId"), Some("00e123"));
        assert!(ctx.contains("profileId"));

        let old = ctx.insert("profileId", "00e456");
        assert_eq!(old, Some(json!("00e123")));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_require_str() {
        let mut ctx = Context::new();
        assert!(matches!(ctx.require_str("missing"), Err(Error::MissingKey(k)) if k == "missing"));

        ctx.insert("count", 3);
        assert!(matches!(ctx.require_str("count"), Err(Error::NotAString(_))));
        assert_eq!(ctx.get_str("count"), None);
        assert_eq!(ctx.get("count"), Some(&json!(3)));
    }
}
