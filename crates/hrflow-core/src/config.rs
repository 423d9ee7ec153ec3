//! Configuration module for HRFlow.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! Status catalogs and loggable-field tables are reference data: they are
//! read once at process start and turned into a policy registry and an audit
//! field registry by the crates that own those concerns.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainError, EntityKind, MessageTemplate, RoleName, Status, StatusId, TransitionRules,
    DEFAULT_ROLE, STATUS_FIELD,
};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for HRFlow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workflow: WorkflowConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

/// Status workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Role granted to every actor in addition to the roles supplied by the identity provider.
    pub default_role: String,
    /// Status catalog of each workflow entity kind.
    pub statuses: BTreeMap<EntityKind, Vec<StatusDefinition>>,
}

/// One status as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDefinition {
    pub id: String,
    pub title: String,
    /// Role name → status ids a holder of that role may move into.
    #[serde(default)]
    pub rules: BTreeMap<String, Vec<String>>,
}

/// Change-audit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// When false, no audit records are captured.
    pub enabled: bool,
    /// Loggable fields of each entity kind: field name → message template.
    pub fields: BTreeMap<EntityKind, BTreeMap<String, String>>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/hrflow/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("hrflow")
            .join("config.yaml")
    }

    /// Parses the configured default role.
    pub fn default_role(&self) -> Result<RoleName, DomainError> {
        RoleName::new(self.workflow.default_role.as_str())
    }

    /// Converts the status catalog of `kind` into domain statuses.
    ///
    /// Returns an empty vector when no catalog is configured for `kind`.
    pub fn statuses_for(&self, kind: EntityKind) -> Result<Vec<Status>, DomainError> {
        self.workflow
            .statuses
            .get(&kind)
            .map(|defs| defs.iter().map(StatusDefinition::to_status).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Returns the loggable-field templates of `kind`.
    pub fn loggable_fields_for(&self, kind: EntityKind) -> BTreeMap<String, MessageTemplate> {
        self.audit
            .fields
            .get(&kind)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(field, template)| (field.clone(), MessageTemplate::new(template.as_str())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl StatusDefinition {
    /// Creates a definition from borrowed strings.
    pub fn new(id: &str, title: &str, rules: &[(&str, &[&str])]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            rules: rules
                .iter()
                .map(|(role, targets)| {
                    (
                        role.to_string(),
                        targets.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Validates identifiers and converts into a domain [`Status`].
    pub fn to_status(&self) -> Result<Status, DomainError> {
        let id = StatusId::new(self.id.as_str())?;
        let mut rules = TransitionRules::new();
        for (role, targets) in &self.rules {
            let role = RoleName::new(role.as_str())?;
            let targets = targets
                .iter()
                .map(|t| StatusId::new(t.as_str()))
                .collect::<Result<Vec<_>, _>>()?;
            rules = rules.with_rule(role, targets);
        }
        Ok(Status::new(id, self.title.as_str(), rules))
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.

/// Builds the four-step approval catalog shared by timesheets and work schedules.
///
/// owner edit → owner accept → manager accept → HR accept, with HR able to
/// move the entity anywhere and managers able to send it back to the owner.
fn approval_catalog(prefix: &str) -> Vec<StatusDefinition> {
    let owner_edit = format!("{prefix}-OWNER-EDIT");
    let owner_accept = format!("{prefix}-OWNER-ACCEPT");
    let manager_accept = format!("{prefix}-MANAGER-ACCEPT");
    let hr_accept = format!("{prefix}-HR-ACCEPT");

    vec![
        StatusDefinition::new(
            &owner_edit,
            "Edited by owner",
            &[
                (DEFAULT_ROLE, &[owner_accept.as_str()]),
                (
                    "ROLE_HR",
                    &[
                        owner_accept.as_str(),
                        manager_accept.as_str(),
                        hr_accept.as_str(),
                    ],
                ),
            ],
        ),
        StatusDefinition::new(
            &owner_accept,
            "Accepted by owner",
            &[
                (
                    "ROLE_DEPARTMENT_MANAGER",
                    &[owner_edit.as_str(), manager_accept.as_str()],
                ),
                (
                    "ROLE_HR",
                    &[
                        owner_edit.as_str(),
                        manager_accept.as_str(),
                        hr_accept.as_str(),
                    ],
                ),
            ],
        ),
        StatusDefinition::new(
            &manager_accept,
            "Accepted by manager",
            &[(
                "ROLE_HR",
                &[
                    owner_edit.as_str(),
                    owner_accept.as_str(),
                    manager_accept.as_str(),
                    hr_accept.as_str(),
                ],
            )],
        ),
        StatusDefinition::new(
            &hr_accept,
            "Accepted by HR",
            &[(
                "ROLE_HR",
                &[
                    owner_edit.as_str(),
                    owner_accept.as_str(),
                    manager_accept.as_str(),
                ],
            )],
        ),
    ]
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let mut statuses = BTreeMap::new();
        statuses.insert(EntityKind::UserTimesheet, approval_catalog("TIMESHEET-STATUS"));
        statuses.insert(
            EntityKind::UserWorkSchedule,
            approval_catalog("WORK-SCHEDULE-STATUS"),
        );
        Self {
            default_role: DEFAULT_ROLE.to_string(),
            statuses,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        let status_template = "Changed status from %s to %s".to_string();

        let mut timesheet = BTreeMap::new();
        timesheet.insert(STATUS_FIELD.to_string(), status_template.clone());

        let mut work_schedule = BTreeMap::new();
        work_schedule.insert(STATUS_FIELD.to_string(), status_template);
        work_schedule.insert(
            "work_schedule_profile".to_string(),
            "Changed profile from %s to %s".to_string(),
        );

        let mut fields = BTreeMap::new();
        fields.insert(EntityKind::UserTimesheet, timesheet);
        fields.insert(EntityKind::UserWorkSchedule, work_schedule);

        Self {
            enabled: true,
            fields,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"workflow.default_role"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- workflow ---
        if let Err(e) = self.default_role() {
            errors.push(ValidationError {
                field: "workflow.default_role".into(),
                message: e.to_string(),
            });
        }

        for (kind, catalog) in &self.workflow.statuses {
            validate_catalog(*kind, catalog, &mut errors);
        }

        // --- audit ---
        for (kind, fields) in &self.audit.fields {
            for (field, template) in fields {
                let path = format!("audit.fields.{kind}.{field}");
                if field.trim().is_empty() {
                    errors.push(ValidationError {
                        field: format!("audit.fields.{kind}"),
                        message: "field name must not be empty".into(),
                    });
                }
                let placeholders = MessageTemplate::new(template.as_str()).placeholder_count();
                if placeholders != 2 {
                    errors.push(ValidationError {
                        field: path,
                        message: format!(
                            "template must contain exactly two %s placeholders (found {placeholders})"
                        ),
                    });
                }
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

fn validate_catalog(kind: EntityKind, catalog: &[StatusDefinition], errors: &mut Vec<ValidationError>) {
    let base = format!("workflow.statuses.{kind}");

    if catalog.is_empty() {
        errors.push(ValidationError {
            field: base.clone(),
            message: "status catalog must not be empty".into(),
        });
        return;
    }

    let mut known = BTreeSet::new();
    for def in catalog {
        if !known.insert(def.id.as_str()) {
            errors.push(ValidationError {
                field: format!("{base}.{}", def.id),
                message: "duplicate status id".into(),
            });
        }
    }

    for def in catalog {
        let path = format!("{base}.{}", def.id);
        if let Err(e) = def.to_status() {
            errors.push(ValidationError {
                field: path.clone(),
                message: e.to_string(),
            });
        }
        for (role, targets) in &def.rules {
            for target in targets {
                if !known.contains(target.as_str()) {
                    errors.push(ValidationError {
                        field: format!("{path}.rules.{role}"),
                        message: format!("unknown target status '{target}'"),
                    });
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use hrflow_core::config::ConfigBuilder;
/// use hrflow_core::domain::EntityKind;
///
/// let config = ConfigBuilder::new()
///     .loggable_field(EntityKind::UserTimesheet, "period", "Changed period from %s to %s")
///     .logging_level("debug")
///     .build();
/// assert!(config.validate().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- workflow ---

    pub fn default_role(mut self, role: impl Into<String>) -> Self {
        self.config.workflow.default_role = role.into();
        self
    }

    /// Replaces the status catalog of `kind`.
    pub fn statuses(mut self, kind: EntityKind, catalog: Vec<StatusDefinition>) -> Self {
        self.config.workflow.statuses.insert(kind, catalog);
        self
    }

    // --- audit ---

    pub fn audit_enabled(mut self, enabled: bool) -> Self {
        self.config.audit.enabled = enabled;
        self
    }

    /// Adds or replaces the template of one loggable field.
    pub fn loggable_field(
        mut self,
        kind: EntityKind,
        field: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.config
            .audit
            .fields
            .entry(kind)
            .or_default()
            .insert(field.into(), template.into());
        self
    }

    /// Removes every loggable field of `kind`.
    pub fn clear_loggable_fields(mut self, kind: EntityKind) -> Self {
        self.config.audit.fields.remove(&kind);
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn sid(s: &str) -> StatusId {
        StatusId::new(s).unwrap()
    }

    fn role(s: &str) -> RoleName {
        RoleName::new(s).unwrap()
    }

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.workflow.default_role, "ROLE_USER");
        assert_eq!(cfg.workflow.statuses.len(), 2);
        assert!(cfg.audit.enabled);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.json);
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    #[test]
    fn default_timesheet_catalog_matches_approval_flow() {
        let cfg = Config::default();
        let statuses = cfg.statuses_for(EntityKind::UserTimesheet).unwrap();
        assert_eq!(statuses.len(), 4);

        let owner_edit = statuses
            .iter()
            .find(|s| s.id().as_str() == "TIMESHEET-STATUS-OWNER-EDIT")
            .unwrap();
        assert!(owner_edit
            .rules()
            .permits(&role("ROLE_USER"), &sid("TIMESHEET-STATUS-OWNER-ACCEPT")));
        assert!(!owner_edit
            .rules()
            .permits(&role("ROLE_USER"), &sid("TIMESHEET-STATUS-HR-ACCEPT")));
        assert!(owner_edit
            .rules()
            .permits(&role("ROLE_HR"), &sid("TIMESHEET-STATUS-HR-ACCEPT")));

        let owner_accept = statuses
            .iter()
            .find(|s| s.id().as_str() == "TIMESHEET-STATUS-OWNER-ACCEPT")
            .unwrap();
        assert!(!owner_accept.rules().permits(
            &role("ROLE_DEPARTMENT_MANAGER"),
            &sid("TIMESHEET-STATUS-HR-ACCEPT")
        ));
    }

    #[test]
    fn default_loggable_fields() {
        let cfg = Config::default();
        let ws = cfg.loggable_fields_for(EntityKind::UserWorkSchedule);
        assert_eq!(ws.len(), 2);
        assert_eq!(
            ws["work_schedule_profile"].as_str(),
            "Changed profile from %s to %s"
        );
        let ts = cfg.loggable_fields_for(EntityKind::UserTimesheet);
        assert_eq!(ts[STATUS_FIELD].as_str(), "Changed status from %s to %s");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
workflow:
  default_role: ROLE_EMPLOYEE
  statuses:
    user_timesheet:
      - id: OPEN
        title: Open
        rules:
          ROLE_EMPLOYEE: [SUBMITTED]
      - id: SUBMITTED
        title: Submitted
audit:
  enabled: true
  fields:
    user_timesheet:
      status: "Status %s -> %s"
logging:
  level: debug
  json: true
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.workflow.default_role, "ROLE_EMPLOYEE");
        assert_eq!(cfg.workflow.statuses.len(), 1);
        let statuses = cfg.statuses_for(EntityKind::UserTimesheet).unwrap();
        assert_eq!(statuses.len(), 2);
        assert!(statuses[1].is_terminal());
        assert!(cfg.statuses_for(EntityKind::UserWorkSchedule).unwrap().is_empty());
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"logging:\n  level: warn\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).unwrap();
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.workflow.statuses.len(), 2);
        assert!(cfg.audit.enabled);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/hrflow/config.yaml"));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_invalid_yaml_fails() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"workflow: [not, a, map]").unwrap();
        tmp.flush().unwrap();
        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn default_path_ends_with_hrflow_config() {
        let path = Config::default_path();
        assert!(path.ends_with("hrflow/config.yaml"));
    }

    // -- Validation --

    #[test]
    fn validate_catches_unknown_target() {
        let cfg = ConfigBuilder::new()
            .statuses(
                EntityKind::UserTimesheet,
                vec![StatusDefinition::new("OPEN", "Open", &[("ROLE_HR", &["CLOSED"])])],
            )
            .build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "workflow.statuses.user_timesheet.OPEN.rules.ROLE_HR");
        assert!(errors[0].message.contains("CLOSED"));
    }

    #[test]
    fn validate_catches_duplicates_and_empty_catalogs() {
        let cfg = ConfigBuilder::new()
            .statuses(
                EntityKind::UserTimesheet,
                vec![
                    StatusDefinition::new("OPEN", "Open", &[]),
                    StatusDefinition::new("OPEN", "Open again", &[]),
                ],
            )
            .statuses(EntityKind::UserWorkSchedule, vec![])
            .build();
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"workflow.statuses.user_timesheet.OPEN".to_string()));
        assert!(fields.contains(&"workflow.statuses.user_work_schedule".to_string()));
    }

    #[test]
    fn validate_catches_malformed_identifiers() {
        let cfg = ConfigBuilder::new()
            .default_role("ROLE USER")
            .statuses(
                EntityKind::UserTimesheet,
                vec![StatusDefinition::new("OPEN", "Open", &[("BAD ROLE", &["OPEN"])])],
            )
            .build();
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"workflow.default_role".to_string()));
        assert!(fields.contains(&"workflow.statuses.user_timesheet.OPEN".to_string()));
    }

    #[test]
    fn validate_catches_bad_templates() {
        let cfg = ConfigBuilder::new()
            .loggable_field(EntityKind::UserTimesheet, "period", "Period is now %s")
            .build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "audit.fields.user_timesheet.period");
    }

    #[test]
    fn validate_catches_bad_log_level() {
        let cfg = ConfigBuilder::new().logging_level("loud").build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "logging.level");
    }

    #[test]
    fn build_validated_reports_errors() {
        let result = ConfigBuilder::new().logging_level("verbose").build_validated();
        assert!(result.is_err());

        let result = ConfigBuilder::new().logging_json(true).build_validated();
        assert!(result.unwrap().logging.json);
    }

    #[test]
    fn builder_clears_loggable_fields() {
        let cfg = ConfigBuilder::new()
            .clear_loggable_fields(EntityKind::UserWorkSchedule)
            .audit_enabled(false)
            .build();
        assert!(cfg.loggable_fields_for(EntityKind::UserWorkSchedule).is_empty());
        assert!(!cfg.audit.enabled);
    }

    #[test]
    fn status_definition_roundtrips_through_yaml() {
        let catalog = approval_catalog("TIMESHEET-STATUS");
        let yaml = serde_yaml::to_string(&catalog).unwrap();
        let decoded: Vec<StatusDefinition> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(decoded, catalog);
    }
}
