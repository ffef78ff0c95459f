//! The `handlers:` configuration block.
//!
//! Handlers form an ordered list even though the YAML source is a mapping:
//! insertion order in the file defines pipeline order, so [`HandlerMap`]
//! deserializes through a map visitor instead of a `HashMap`.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use cadence_types::{PipeError, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HandlerType {
    #[default]
    Http,
    Filter,
}

/// Configuration for one pipeline stage: a kind tag plus the kind-specific
/// settings block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Handler {
    #[serde(default, rename = "type")]
    pub kind: HandlerType,

    #[serde(default)]
    pub http: HttpHandler,

    #[serde(default)]
    pub filter: FilterHandler,
}

impl Handler {
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            HandlerType::Http => self.http.validate(),
            HandlerType::Filter => self.filter.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpHandler {
    pub url: String,
    pub method: String,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    #[serde(with = "crate::duration_serde")]
    pub timeout: Duration,
    pub expected_response_code: u16,
    pub retries: u32,
    #[serde(with = "crate::duration_serde")]
    pub retry_interval: Duration,
    pub parallel_run: bool,
}

impl Default for HttpHandler {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: String::new(),
            body: String::new(),
            headers: HashMap::new(),
            query_params: HashMap::new(),
            timeout: Duration::from_secs(15),
            expected_response_code: 200,
            retries: 0,
            retry_interval: Duration::ZERO,
            parallel_run: false,
        }
    }
}

impl HttpHandler {
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(PipeError::Config("'url' is required".into()));
        }
        if self.method.is_empty() {
            return Err(PipeError::Config("'method' is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterHandler {
    pub expression: String,
    pub expect_false: bool,
}

impl FilterHandler {
    pub fn validate(&self) -> Result<()> {
        if self.expression.is_empty() {
            return Err(PipeError::Config("'expression' is required".into()));
        }
        // Parse-only check: placeholders become quoted key names so the
        // expression is syntactically checkable without a runtime context.
        let literal_form = cadence_expr::substitute_for_validation(&self.expression);
        cadence_expr::parse(&literal_form)
            .map_err(|e| PipeError::Config(format!("failed to parse expression: {e}")))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HandlerMap — an ordered list deserialized from a YAML mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerEntry {
    pub name: String,
    pub handler: Handler,
}

/// The ordered handler list. Guarantees that iteration order matches the
/// declaration order in the YAML source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerMap(Vec<HandlerEntry>);

impl HandlerMap {
    pub fn iter(&self) -> std::slice::Iter<'_, HandlerEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<HandlerEntry>> for HandlerMap {
    fn from(entries: Vec<HandlerEntry>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a HandlerMap {
    type Item = &'a HandlerEntry;
    type IntoIter = std::slice::Iter<'a, HandlerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for HandlerMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HandlerMapVisitor;

        impl<'de> Visitor<'de> for HandlerMapVisitor {
            type Value = HandlerMap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a mapping of handler name to handler config")
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, handler)) = access.next_entry::<String, Handler>()? {
                    entries.push(HandlerEntry { name, handler });
                }
                Ok(HandlerMap(entries))
            }
        }

        deserializer.deserialize_map(HandlerMapVisitor)
    }
}

impl Serialize for HandlerMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.name, &entry.handler)?;
        }
        map.end()
    }
}
