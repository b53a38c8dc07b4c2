//! Declarative input schemas.
//!
//! A [`Schema`] is a static list of [`Field`]s checked in declaration order
//! against a raw JSON object. Checking stops at the first violation, which
//! is reported as a [`ValidationIssue`]. Fields not named by the schema are
//! ignored.

use common::TaggedError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{Constraint, ValidationIssue};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[derive(Debug)]
pub enum FieldType {
    /// String with length/format constraints. Length counts characters.
    Text(&'static [Constraint]),
    Bool,
    Object(&'static Schema),
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

impl Field {
    pub const fn text(name: &'static str, rules: &'static [Constraint]) -> Self {
        Self { name, ty: FieldType::Text(rules), required: true }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self { name, ty: FieldType::Bool, required: true }
    }

    pub const fn object(name: &'static str, schema: &'static Schema) -> Self {
        Self { name, ty: FieldType::Object(schema), required: true }
    }

    pub const fn optional(self) -> Self {
        Self { required: false, ..self }
    }
}

#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    /// Check `raw` and report the first violated constraint.
    pub fn check(&self, raw: &Value) -> Result<(), ValidationIssue> {
        let obj = raw.as_object().ok_or_else(|| self.issue(String::from("<root>"), Constraint::Type("object")))?;
        self.check_object(obj, "")
    }

    /// Check `raw`, then deserialize it into the typed payload.
    pub fn parse<T: DeserializeOwned>(&self, raw: &Value) -> Result<T, TaggedError> {
        self.check(raw)?;
        serde_json::from_value(raw.clone()).map_err(|e| {
            TaggedError::validation(format!("invalid {} input: {e}", self.name)).with_cause(e)
        })
    }

    fn check_object(&self, obj: &Map<String, Value>, prefix: &str) -> Result<(), ValidationIssue> {
        for field in self.fields {
            let path = format!("{prefix}{}", field.name);
            match obj.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(self.issue(path, Constraint::Required));
                    }
                }
                Some(value) => self.check_field(field, value, path)?,
            }
        }
        Ok(())
    }

    fn check_field(&self, field: &Field, value: &Value, path: String) -> Result<(), ValidationIssue> {
        match &field.ty {
            FieldType::Text(rules) => {
                let text = value.as_str().ok_or_else(|| self.issue(path.clone(), Constraint::Type("string")))?;
                let len = text.chars().count();
                for rule in rules.iter() {
                    let ok = match rule {
                        Constraint::MinLength(min) => len >= *min,
                        Constraint::MaxLength(max) => len <= *max,
                        Constraint::Email => EMAIL_RE.is_match(text),
                        Constraint::Required | Constraint::Type(_) => true,
                    };
                    if !ok {
                        return Err(self.issue(path, *rule));
                    }
                }
                Ok(())
            }
            FieldType::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(self.issue(path, Constraint::Type("boolean")))
                }
            }
            FieldType::Object(schema) => {
                let obj = value.as_object().ok_or_else(|| self.issue(path.clone(), Constraint::Type("object")))?;
                // Nested issues are reported against the outer schema.
                schema
                    .check_object(obj, &format!("{path}."))
                    .map_err(|inner| self.issue(inner.field, inner.constraint))
            }
        }
    }

    fn issue(&self, field: String, constraint: Constraint) -> ValidationIssue {
        ValidationIssue { schema: self.name, field, constraint }
    }
}
