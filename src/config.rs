//! Provider configuration loading via `ortho-config`.
//!
//! [`ProviderConfig`] holds the identity credentials, region and timeouts
//! shared by every elastic IP operation. Values merge defaults, the
//! `vpc-eip.toml` configuration file and `OS_*` environment variables.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::endpoint::EndpointOpts;
use crate::identity::{AuthOptions, Availability, Credentials, IdentityError};
use crate::lifecycle::Timeouts;

/// Default endpoint interface.
pub const DEFAULT_ENDPOINT_TYPE: &str = "public";

/// Default identity domain for password authentication.
pub const DEFAULT_DOMAIN_NAME: &str = "Default";

/// Identity and service settings for the VPC provider.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "OS",
    discovery(
        app_name = "vpc-eip",
        env_var = "VPC_EIP_CONFIG_PATH",
        config_file_name = "vpc-eip.toml",
        dotfile_name = ".vpc-eip.toml",
        project_file_name = "vpc-eip.toml"
    )
)]
pub struct ProviderConfig {
    /// Identity v3 endpoint. Required.
    #[ortho_config(default = String::new())]
    pub auth_url: String,
    /// Region whose endpoints are used. Required.
    #[ortho_config(default = String::new())]
    pub region: String,
    /// User name for password authentication.
    pub user_name: Option<String>,
    /// Password for password authentication.
    pub password: Option<String>,
    /// Domain owning the user.
    #[ortho_config(default = DEFAULT_DOMAIN_NAME.to_owned())]
    pub domain_name: String,
    /// Project the token is scoped to.
    pub tenant_id: Option<String>,
    /// Existing token, used instead of a user name and password.
    pub token: Option<String>,
    /// Catalog interface: `public`, `internal` or `admin`.
    #[ortho_config(default = DEFAULT_ENDPOINT_TYPE.to_owned())]
    pub endpoint_type: String,
    /// Explicit VPC v1 endpoint, bypassing catalog lookup.
    pub vpc_endpoint: Option<String>,
    /// Seconds to wait for a new address to become active.
    #[ortho_config(default = 600)]
    pub create_timeout_secs: u64,
    /// Seconds to wait for a released address to disappear.
    #[ortho_config(default = 600)]
    pub delete_timeout_secs: u64,
    /// Per-request HTTP timeout in seconds.
    #[ortho_config(default = 30)]
    pub http_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to vpc-eip.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

const AUTH_URL: FieldMetadata =
    FieldMetadata::new("identity endpoint", "OS_AUTH_URL", "auth_url");
const REGION: FieldMetadata = FieldMetadata::new("region", "OS_REGION", "region");

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

impl ProviderConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("vpc-eip")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(metadata.missing());
        }
        Ok(())
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and configuration key that supply each value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required value or the
    /// credentials are absent, and [`ConfigError::InvalidValue`] when a value
    /// cannot be interpreted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(&self.auth_url, &AUTH_URL)?;
        Self::require_field(&self.region, &REGION)?;
        self.credentials()?;
        self.availability()?;
        for (key, secs) in [
            ("create_timeout_secs", self.create_timeout_secs),
            ("delete_timeout_secs", self.delete_timeout_secs),
            ("http_timeout_secs", self.http_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    field: key.to_owned(),
                    message: String::from("must be greater than zero"),
                });
            }
        }
        Ok(())
    }

    /// Builds the identity request parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn auth_options(&self) -> Result<AuthOptions, ConfigError> {
        self.validate()?;
        Ok(AuthOptions {
            auth_url: self.auth_url.trim().to_owned(),
            credentials: self.credentials()?,
            project_id: non_blank(self.tenant_id.as_deref()).map(str::to_owned),
        })
    }

    /// Builds endpoint resolution options. A non-blank `region` overrides
    /// the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `endpoint_type` is unknown.
    pub fn endpoint_opts(&self, region: Option<&str>) -> Result<EndpointOpts, ConfigError> {
        let chosen = non_blank(region).unwrap_or_else(|| self.region.trim());
        Ok(EndpointOpts::new(chosen)
            .availability(self.availability()?)
            .endpoint_override(non_blank(self.vpc_endpoint.as_deref()).map(str::to_owned)))
    }

    /// Deadlines for create and delete.
    #[must_use]
    pub const fn timeouts(&self) -> Timeouts {
        Timeouts {
            create: Duration::from_secs(self.create_timeout_secs),
            delete: Duration::from_secs(self.delete_timeout_secs),
        }
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    fn availability(&self) -> Result<Availability, ConfigError> {
        self.endpoint_type
            .parse()
            .map_err(|err: IdentityError| ConfigError::InvalidValue {
                field: String::from("endpoint_type"),
                message: err.to_string(),
            })
    }

    fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(token) = non_blank(self.token.as_deref()) {
            return Ok(Credentials::Token(token.to_owned()));
        }
        match (
            non_blank(self.user_name.as_deref()),
            non_blank(self.password.as_deref()),
        ) {
            (Some(user_name), Some(password)) => Ok(Credentials::Password {
                user_name: user_name.to_owned(),
                password: password.to_owned(),
                domain_name: self.domain_name.trim().to_owned(),
            }),
            _ => Err(ConfigError::MissingField(String::from(
                "missing credentials: set OS_TOKEN, or OS_USER_NAME and OS_PASSWORD, \
                 or add token or user_name and password to vpc-eip.toml",
            ))),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configured value cannot be used.
    #[error("invalid configuration value for {field}: {message}")]
    InvalidValue {
        /// Configuration key.
        field: String,
        /// Reason the value was rejected.
        message: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
