use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::foundation::error::{SheetError, SheetResult};

/// A parsed animation description: a key-ordered JSON object.
///
/// Key order is preserved on every rewrite because engines may reject a
/// reordered Lottie document. Equality compares the data, not the text it
/// was parsed from.
#[derive(Clone, Debug)]
pub struct AnimationDocument {
    root: Map<String, Value>,
    source: Option<String>,
}

impl AnimationDocument {
    pub fn parse(text: &str) -> SheetResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(root) = value else {
            return Err(SheetError::unrecognized(
                "top-level JSON value is not an object",
            ));
        };
        Ok(Self {
            root,
            source: Some(text.to_owned()),
        })
    }

    pub fn from_map(root: Map<String, Value>) -> Self {
        Self { root, source: None }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Text handed to the rendering engine: the original text when there is
    /// one, otherwise a compact re-serialization in key order.
    pub fn engine_text(&self) -> SheetResult<Cow<'_, str>> {
        match &self.source {
            Some(text) => Ok(Cow::Borrowed(text)),
            None => Ok(Cow::Owned(self.to_text()?)),
        }
    }

    pub fn to_text(&self) -> SheetResult<String> {
        serde_json::to_string(&self.root)
            .map_err(|e| SheetError::Other(anyhow::Error::new(e).context("serialize document")))
    }

    /// Copy with `entries` set at top level; existing keys keep their position.
    pub fn with_entries<I>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let mut root = self.root.clone();
        for (key, value) in entries {
            root.insert(key.to_owned(), value);
        }
        Self::from_map(root)
    }
}

impl PartialEq for AnimationDocument {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_original_text_for_the_engine() {
        let text = "{ \"v\": \"5.7.0\",\n  \"w\": 10 }";
        let doc = AnimationDocument::parse(text).unwrap();
        assert_eq!(doc.engine_text().unwrap(), text);
        assert_eq!(doc.get("w"), Some(&Value::from(10)));
    }

    #[test]
    fn malformed_text_reports_position() {
        let err = AnimationDocument::parse("{\"w\": 1,\n\"h\" 2}").unwrap_err();
        let SheetError::DocumentParse { line, .. } = err else {
            panic!("expected parse error, got {err}");
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn non_object_is_unrecognized() {
        let err = AnimationDocument::parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, SheetError::UnrecognizedFormat { .. }));
    }

    #[test]
    fn rewrites_keep_key_order() {
        let doc = AnimationDocument::parse(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let updated = doc.with_entries([("a", Value::from(9)), ("gd_rows", Value::from(-1))]);
        assert_eq!(updated.to_text().unwrap(), r#"{"z":1,"a":9,"m":3,"gd_rows":-1}"#);
        assert_eq!(updated.engine_text().unwrap(), updated.to_text().unwrap());
    }

    #[test]
    fn equality_ignores_formatting() {
        let a = AnimationDocument::parse(r#"{"w":1,"h":2}"#).unwrap();
        let b = AnimationDocument::parse("{ \"w\" : 1 ,\n \"h\" : 2 }").unwrap();
        assert_eq!(a, b);
    }
}
