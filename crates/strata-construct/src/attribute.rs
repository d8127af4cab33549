//! Attribute values and lazy references.
//!
//! A value that is only known after the referenced resource is provisioned
//! is modeled as [`AttrValue::Reference`]. References may sit anywhere in a
//! value tree: inside lists, maps, string templates, or encoded documents.
//! The graph builder walks the whole tree to turn every one of them into a
//! dependency edge.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use strata_common::error::{Result, StrataError};
use strata_common::types::LogicalId;

/// Attribute bag of a resource, ordered by attribute name.
pub type Attributes = BTreeMap<String, AttrValue>;

/// "Attribute `attribute` of resource `target`", available after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeReference {
    target: LogicalId,
    attribute: String,
}

impl AttributeReference {
    /// Creates a reference to `attribute` on the resource `target`.
    #[must_use]
    pub fn new(target: impl Into<LogicalId>, attribute: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            attribute: attribute.into(),
        }
    }

    /// Logical id of the referenced resource.
    #[must_use]
    pub const fn target(&self) -> &LogicalId {
        &self.target
    }

    /// Name of the referenced attribute.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Symbolic expression emitted in place of the unknown value.
    #[must_use]
    pub fn expression(&self) -> String {
        format!("${{{self}}}")
    }
}

impl fmt::Display for AttributeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.attribute)
    }
}

/// One piece of an interpolated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text.
    Text(String),
    /// Interpolated reference.
    Reference(AttributeReference),
}

impl From<&str> for TemplatePart {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TemplatePart {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<AttributeReference> for TemplatePart {
    fn from(value: AttributeReference) -> Self {
        Self::Reference(value)
    }
}

/// A resource attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Explicit null.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// String literal.
    String(String),
    /// Ordered sequence.
    List(Vec<AttrValue>),
    /// Nested mapping, ordered by key.
    Map(BTreeMap<String, AttrValue>),
    /// Value of another resource's attribute.
    Reference(AttributeReference),
    /// String built from literal text and references.
    Template(Vec<TemplatePart>),
    /// Document serialized to a compact JSON string (e.g. an IAM policy).
    Encoded(Box<AttrValue>),
    /// A value a collaborator has not supplied yet.
    Placeholder(String),
}

impl AttrValue {
    /// Builds a map value from key/value pairs.
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a list value.
    #[must_use]
    pub fn list<V: Into<Self>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds an interpolated string.
    #[must_use]
    pub fn template(parts: impl IntoIterator<Item = TemplatePart>) -> Self {
        Self::Template(parts.into_iter().collect())
    }

    /// Wraps a document that is emitted as a JSON string.
    #[must_use]
    pub fn encoded(document: Self) -> Self {
        Self::Encoded(Box::new(document))
    }

    /// Marks a value that must be supplied before synthesis.
    #[must_use]
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self::Placeholder(name.into())
    }

    /// Calls `visit` for every reference in this value, depth first.
    pub fn visit_references<'a>(&'a self, visit: &mut dyn FnMut(&'a AttributeReference)) {
        match self {
            Self::Reference(r) => visit(r),
            Self::List(items) => {
                for item in items {
                    item.visit_references(visit);
                }
            }
            Self::Map(entries) => {
                for value in entries.values() {
                    value.visit_references(visit);
                }
            }
            Self::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Reference(r) = part {
                        visit(r);
                    }
                }
            }
            Self::Encoded(inner) => inner.visit_references(visit),
            Self::Null | Self::Bool(_) | Self::Integer(_) | Self::String(_) | Self::Placeholder(_) => {}
        }
    }

    /// Collects every reference in this value.
    #[must_use]
    pub fn references(&self) -> Vec<&AttributeReference> {
        let mut found = Vec::new();
        self.visit_references(&mut |r| found.push(r));
        found
    }

    /// Renders the value into its artifact form.
    ///
    /// `owner` and `attribute` identify where the value lives and are only
    /// used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns `StrataError::UnresolvedPlaceholder` if a placeholder is found.
    pub fn render(&self, owner: &LogicalId, attribute: &str) -> Result<Value> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Integer(n) => Value::from(*n),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.render(owner, attribute))
                    .collect::<Result<_>>()?,
            ),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.render(owner, attribute)?)))
                    .collect::<Result<_>>()?,
            ),
            Self::Reference(r) => Value::String(r.expression()),
            Self::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Reference(r) => out.push_str(&r.expression()),
                    }
                }
                Value::String(out)
            }
            Self::Encoded(inner) => Value::String(serde_json::to_string(&inner.render(owner, attribute)?)?),
            Self::Placeholder(name) => {
                return Err(StrataError::UnresolvedPlaceholder {
                    logical_id: owner.to_string(),
                    attribute: attribute.to_string(),
                    placeholder: name.clone(),
                });
            }
        })
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<AttributeReference> for AttrValue {
    fn from(value: AttributeReference) -> Self {
        Self::Reference(value)
    }
}

impl From<Vec<Self>> for AttrValue {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Self>> for AttrValue {
    fn from(value: BTreeMap<String, Self>) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn owner() -> LogicalId {
        LogicalId::new("owner")
    }

    #[test]
    fn reference_renders_as_symbolic_expression() {
        let r = AttributeReference::new("site_bucket", "bucket_domain_name");
        assert_eq!(r.to_string(), "site_bucket.bucket_domain_name");
        let value = AttrValue::from(r).render(&owner(), "domain").expect("render");
        assert_eq!(value, json!("${site_bucket.bucket_domain_name}"));
    }

    #[test]
    fn references_found_in_nested_values() {
        let value = AttrValue::map([
            ("plain", AttrValue::from("x")),
            (
                "origin",
                AttrValue::list([AttrValue::map([(
                    "domain_name",
                    AttributeReference::new("bucket", "domain").into(),
                )])]),
            ),
            (
                "policy",
                AttrValue::encoded(AttrValue::template([
                    TemplatePart::from("principal "),
                    AttributeReference::new("oai", "id").into(),
                ])),
            ),
        ]);

        let targets: Vec<String> = value
            .references()
            .iter()
            .map(|r| r.target().to_string())
            .collect();
        assert_eq!(targets, vec!["bucket", "oai"]);
    }

    #[test]
    fn template_interpolates_references() {
        let value = AttrValue::template([
            TemplatePart::from("https://"),
            AttributeReference::new("cdn", "domain_name").into(),
        ]);
        let rendered = value.render(&owner(), "value").expect("render");
        assert_eq!(rendered, json!("https://${cdn.domain_name}"));
    }

    #[test]
    fn encoded_document_becomes_compact_json_string() {
        let value = AttrValue::encoded(AttrValue::map([
            ("Version", AttrValue::from("2012-10-17")),
            ("Count", AttrValue::from(2)),
        ]));
        let rendered = value.render(&owner(), "policy").expect("render");
        assert_eq!(rendered, json!(r#"{"Count":2,"Version":"2012-10-17"}"#));
    }

    #[test]
    fn placeholder_fails_rendering_with_location() {
        let value = AttrValue::list([AttrValue::placeholder("function archive")]);
        let err = value.render(&owner(), "filename").unwrap_err();
        match err {
            StrataError::UnresolvedPlaceholder {
                logical_id,
                attribute,
                placeholder,
            } => {
                assert_eq!(logical_id, "owner");
                assert_eq!(attribute, "filename");
                assert_eq!(placeholder, "function archive");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn literals_pass_through() {
        let value = AttrValue::map([
            ("enabled", AttrValue::from(true)),
            ("ttl", AttrValue::from(86_400)),
            ("nothing", AttrValue::Null),
        ]);
        let rendered = value.render(&owner(), "cfg").expect("render");
        assert_eq!(rendered, json!({"enabled": true, "ttl": 86400, "nothing": null}));
        assert!(value.references().is_empty());
    }
}
