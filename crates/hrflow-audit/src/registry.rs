//! Loggable field registry
//!
//! Maps each workflow entity kind to the fields whose changes are audited and
//! the message template used for each. Loaded once at process start; a field
//! that is absent from the registry is simply not logged.

use std::collections::BTreeMap;

use hrflow_core::config::Config;
use hrflow_core::domain::{DomainError, EntityKind, MessageTemplate};
use tracing::debug;

/// Static table: entity kind → field name → message template
#[derive(Debug, Clone, Default)]
pub struct LoggableFieldRegistry {
    fields: BTreeMap<EntityKind, BTreeMap<String, MessageTemplate>>,
}

impl LoggableFieldRegistry {
    /// Creates an empty registry (nothing is logged)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry from the `audit` section of `config`
    ///
    /// Returns an empty registry when auditing is disabled.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationFailed` if a template does not hold
    /// exactly one placeholder for the old and one for the new value.
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        if !config.audit.enabled {
            debug!("Change audit disabled; loggable field registry is empty");
            return Ok(Self::new());
        }

        let mut fields = BTreeMap::new();
        for kind in config.audit.fields.keys().copied() {
            let templates = config.loggable_fields_for(kind);
            for (field, template) in &templates {
                let placeholders = template.placeholder_count();
                if placeholders != 2 {
                    return Err(DomainError::ValidationFailed(format!(
                        "audit.fields.{kind}.{field}: template must contain exactly two %s placeholders (found {placeholders})"
                    )));
                }
            }
            fields.insert(kind, templates);
        }

        debug!(
            kinds = fields.len(),
            fields = fields.values().map(BTreeMap::len).sum::<usize>(),
            "Loggable field registry loaded"
        );

        Ok(Self { fields })
    }

    /// Registers `field` of `kind` with `template`
    pub fn with_field(
        mut self,
        kind: EntityKind,
        field: impl Into<String>,
        template: impl Into<MessageTemplate>,
    ) -> Self {
        self.fields
            .entry(kind)
            .or_default()
            .insert(field.into(), template.into());
        self
    }

    /// Returns the template of `field` on `kind`, if the field is loggable
    pub fn template_for(&self, kind: EntityKind, field: &str) -> Option<&MessageTemplate> {
        self.fields.get(&kind).and_then(|fields| fields.get(field))
    }

    pub fn is_loggable(&self, kind: EntityKind, field: &str) -> bool {
        self.template_for(kind, field).is_some()
    }

    /// Iterates over the loggable fields of `kind` in name order
    pub fn fields_of(&self, kind: EntityKind) -> impl Iterator<Item = (&str, &MessageTemplate)> {
        self.fields
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|(field, template)| (field.as_str(), template))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(BTreeMap::is_empty)
    }
}
