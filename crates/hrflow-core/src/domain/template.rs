//! Audit message templates
//!
//! A template such as `"Changed status from %s to %s"` is populated with the
//! old and the new value of a field. `%s` placeholders are filled left to
//! right; `%%` renders a literal percent sign; placeholders beyond the
//! supplied arguments render empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::change_set::FieldValue;

/// A per-field audit message template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageTemplate(String);

impl MessageTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Counts the `%s` placeholders, ignoring escaped `%%`
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut chars = self.0.chars();
        while let Some(c) = chars.next() {
            if c == '%' {
                match chars.next() {
                    Some('s') => count += 1,
                    Some(_) | None => {}
                }
            }
        }
        count
    }

    /// Populates the template with `old` and `new`
    pub fn render(&self, old: &FieldValue, new: &FieldValue) -> String {
        let args = [old.to_string(), new.to_string()];
        let mut args = args.iter();
        let mut out = String::with_capacity(self.0.len() + 16);
        let mut chars = self.0.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('s') => {
                    if let Some(arg) = args.next() {
                        out.push_str(arg);
                    }
                }
                Some('%') => out.push('%'),
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            }
        }
        out
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageTemplate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MessageTemplate {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
