//! Identity (Keystone v3) authentication and the resulting provider client.
//!
//! A [`ProviderClient`] holds the issued token and the project-scoped
//! service catalog. It is the generic starting point from which service
//! clients such as the VPC v1 client are derived.

mod catalog;
mod error;
mod service;

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

pub use catalog::{Availability, CatalogEndpoint, CatalogEntry, ServiceCatalog};
pub use error::ApiError;
pub use service::ServiceClient;

const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Errors raised while authenticating or reading the catalog.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum IdentityError {
    /// Raised when the identity service cannot be reached.
    #[error("identity transport error: {message}")]
    Transport {
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the identity service rejects the credentials.
    #[error("authentication against {url} failed with status {status}: {body}")]
    Rejected {
        /// Token endpoint that was called.
        url: String,
        /// HTTP status code returned.
        status: u16,
        /// Response body, decoded lossily.
        body: String,
    },
    /// Raised when the response carries no `X-Subject-Token` header.
    #[error("identity response from {url} is missing the X-Subject-Token header")]
    MissingToken {
        /// Token endpoint that was called.
        url: String,
    },
    /// Raised when the token body cannot be decoded.
    #[error("failed to decode identity response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
    /// Raised when an endpoint interface name is not recognised.
    #[error("unknown endpoint interface '{value}' (expected public, internal or admin)")]
    InvalidAvailability {
        /// Value supplied by the caller.
        value: String,
    },
}

/// Credentials presented to the identity service.
#[derive(Clone, Eq, PartialEq)]
pub enum Credentials {
    /// User name and password, resolved in the given domain.
    Password {
        /// User name.
        user_name: String,
        /// Password.
        password: String,
        /// Domain owning the user.
        domain_name: String,
    },
    /// A previously issued token exchanged for a project-scoped one.
    Token(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password {
                user_name,
                domain_name,
                ..
            } => f
                .debug_struct("Password")
                .field("user_name", user_name)
                .field("password", &"<redacted>")
                .field("domain_name", domain_name)
                .finish(),
            Self::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

/// Parameters for a project-scoped token request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthOptions {
    /// Identity v3 base URL, for example `https://iam.example.com/v3`.
    pub auth_url: String,
    /// Credentials to present.
    pub credentials: Credentials,
    /// Project the token is scoped to.
    pub project_id: Option<String>,
}

impl AuthOptions {
    fn tokens_url(&self) -> String {
        format!("{}/auth/tokens", self.auth_url.trim_end_matches('/'))
    }

    fn request_body(&self) -> Value {
        let identity = match &self.credentials {
            Credentials::Password {
                user_name,
                password,
                domain_name,
            } => json!({
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": user_name,
                        "password": password,
                        "domain": { "name": domain_name },
                    }
                }
            }),
            Credentials::Token(token) => json!({
                "methods": ["token"],
                "token": { "id": token }
            }),
        };

        let mut auth = json!({ "identity": identity });
        if let (Some(project_id), Some(object)) = (&self.project_id, auth.as_object_mut()) {
            object.insert(
                String::from("scope"),
                json!({ "project": { "id": project_id } }),
            );
        }
        json!({ "auth": auth })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Deserialize)]
struct TokenBody {
    #[serde(default)]
    catalog: ServiceCatalog,
}

/// Authenticated client: HTTP transport, token and service catalog.
#[derive(Clone, Debug)]
pub struct ProviderClient {
    http: reqwest::Client,
    token: String,
    catalog: ServiceCatalog,
}

impl ProviderClient {
    /// Wraps an already issued token and catalog.
    #[must_use]
    pub fn from_parts(
        http: reqwest::Client,
        token: impl Into<String>,
        catalog: ServiceCatalog,
    ) -> Self {
        Self {
            http,
            token: token.into(),
            catalog,
        }
    }

    /// Requests a project-scoped token and captures the service catalog.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the identity service is unreachable,
    /// rejects the credentials, or answers without a token.
    pub async fn authenticate(
        http: reqwest::Client,
        options: &AuthOptions,
    ) -> Result<Self, IdentityError> {
        let url = options.tokens_url();
        debug!(%url, project_id = ?options.project_id, "requesting identity token");

        let response = http
            .post(&url)
            .json(&options.request_body())
            .send()
            .await
            .map_err(|err| IdentityError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|err| IdentityError::Transport {
                message: err.to_string(),
            })?;

        if !status.is_success() {
            return Err(IdentityError::Rejected {
                url,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let Some(token) = token else {
            return Err(IdentityError::MissingToken { url });
        };

        let parsed: TokenResponse =
            serde_json::from_slice(&body).map_err(|err| IdentityError::Decode {
                message: err.to_string(),
            })?;

        debug!(
            services = parsed.token.catalog.entries().len(),
            "identity token issued"
        );
        Ok(Self::from_parts(http, token, parsed.token.catalog))
    }

    /// Service catalog captured at authentication time.
    #[must_use]
    pub const fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Derives a [`ServiceClient`] for an explicit endpoint URL.
    #[must_use]
    pub fn service_client(&self, endpoint: impl Into<String>) -> ServiceClient {
        ServiceClient::new(self.http.clone(), self.token.clone(), endpoint)
    }
}

/// Builds the shared HTTP client with a per-request timeout.
///
/// # Errors
///
/// Returns [`IdentityError::Transport`] when the TLS backend or resolver
/// cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, IdentityError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| IdentityError::Transport {
            message: err.to_string(),
        })
}
