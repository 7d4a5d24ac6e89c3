use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Issue type used when none is pinned and the lookup fails
pub const DEFAULT_ISSUE_TYPE_ID: &str = "10004";

const ENV_PREFIX: &str = "SHAKE_REPORT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration field: {0}")]
    MissingField(&'static str),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Credentials and target project for the ticketing service.
/// Fixed for the lifetime of the reporter built from it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// `acme`, `acme.atlassian.net` or a full `https://` base URL
    pub domain: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    /// Pins the issue type; when unset the reporter looks one up
    #[serde(default)]
    pub issue_type_id: Option<String>,
}

// Keep the token out of logs
impl std::fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("domain", &self.domain)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("project_key", &self.project_key)
            .field("issue_type_id", &self.issue_type_id)
            .finish()
    }
}

impl ReporterConfig {
    pub fn new(
        domain: impl Into<String>,
        email: impl Into<String>,
        api_token: impl Into<String>,
        project_key: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            email: email.into(),
            api_token: api_token.into(),
            project_key: project_key.into(),
            issue_type_id: None,
        }
    }

    pub fn with_issue_type_id(mut self, id: impl Into<String>) -> Self {
        self.issue_type_id = Some(id.into());
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `SHAKE_REPORT_DOMAIN`, `_EMAIL`, `_API_TOKEN`, `_PROJECT_KEY` and
    /// the optional `_ISSUE_TYPE_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |key: &'static str, field: &'static str| {
            lookup(key).ok_or(ConfigError::MissingField(field))
        };

        let config = Self {
            domain: require("DOMAIN", "domain")?,
            email: require("EMAIL", "email")?,
            api_token: require("API_TOKEN", "api_token")?,
            project_key: require("PROJECT_KEY", "project_key")?,
            issue_type_id: lookup("ISSUE_TYPE_ID").filter(|id| !id.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("domain", &self.domain),
            ("email", &self.email),
            ("api_token", &self.api_token),
            ("project_key", &self.project_key),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name));
            }
        }
        Ok(())
    }

    /// Base URL of the service, without a trailing slash
    pub fn base_url(&self) -> String {
        let domain = self.domain.trim().trim_end_matches('/');
        if domain.starts_with("https://") || domain.starts_with("http://") {
            domain.to_string()
        } else if domain.contains('.') {
            format!("https://{domain}")
        } else {
            format!("https://{domain}.atlassian.net")
        }
    }

    /// `Basic base64(email:api_token)`
    pub fn auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.email, self.api_token);
        format!("Basic {}", general_purpose::STANDARD.encode(credentials))
    }

    pub fn pinned_issue_type(&self) -> Option<&str> {
        self.issue_type_id.as_deref()
    }

    pub fn default_issue_type_id(&self) -> &str {
        self.pinned_issue_type().unwrap_or(DEFAULT_ISSUE_TYPE_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> ReporterConfig {
        ReporterConfig::new("acme", "dev@acme.io", "s3cret", "PROJ")
    }

    #[test]
    fn test_base_url_forms() {
        assert_eq!(config().base_url(), "https://acme.atlassian.net");

        let mut config = config();
        config.domain = "acme.example.com/".to_string();
        assert_eq!(config.base_url(), "https://acme.example.com");

        config.domain = "http://localhost:8080/".to_string();
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_auth_header() {
        // base64("dev@acme.io:s3cret")
        assert_eq!(config().auth_header(), "Basic ZGV2QGFjbWUuaW86czNjcmV0");
    }

    #[test]
    fn test_default_issue_type() {
        assert_eq!(config().default_issue_type_id(), "10004");
        assert_eq!(config().with_issue_type_id("7").default_issue_type_id(), "7");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut config = config();
        config.api_token = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField("api_token"))));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("DOMAIN", "acme"),
            ("EMAIL", "dev@acme.io"),
            ("API_TOKEN", "t"),
            ("PROJECT_KEY", "PROJ"),
        ]
        .into_iter()
        .collect();
        let config = ReporterConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.project_key, "PROJ");
        assert_eq!(config.issue_type_id, None);

        let missing = ReporterConfig::from_lookup(|_| None);
        assert!(matches!(missing, Err(ConfigError::MissingField("domain"))));
    }

    #[test]
    fn test_json_issue_type_is_optional() {
        let json = r#"{"domain":"acme","email":"a@b.c","api_token":"t","project_key":"P"}"#;
        let config: ReporterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.issue_type_id, None);
        assert!(!format!("{config:?}").contains("\"t\""));
    }
}
