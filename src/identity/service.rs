//! Authenticated HTTP client bound to a single service endpoint.

use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ApiError;

/// Header carrying the identity token on every service request.
pub(crate) const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Client for one service family, holding the token and resolved endpoint.
///
/// The endpoint always ends with `/`; [`ServiceClient::service_url`] appends
/// each part as one percent-encoded path segment.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    http: reqwest::Client,
    token: String,
    endpoint: String,
}

impl ServiceClient {
    /// Creates a service client for `endpoint`, authenticating with `token`.
    #[must_use]
    pub fn new(http: reqwest::Client, token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let mut normalised: String = endpoint.into();
        if !normalised.ends_with('/') {
            normalised.push('/');
        }
        Self {
            http,
            token: token.into(),
            endpoint: normalised,
        }
    }

    /// Base URL every request is resolved against.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Appends `parts` to the endpoint, each as a single path segment.
    ///
    /// Reserved characters such as `/`, `?` and `%` are percent-encoded, so
    /// an identifier can only ever address the resource it names.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidSegment`] for an empty, `.` or `..` part
    /// and [`ApiError::InvalidEndpoint`] when the endpoint is not a base URL.
    pub fn service_url(&self, parts: &[&str]) -> Result<String, ApiError> {
        if let Some(segment) = parts.iter().find(|part| matches!(**part, "" | "." | "..")) {
            return Err(ApiError::InvalidSegment {
                segment: (*segment).to_owned(),
            });
        }
        let invalid_endpoint = |message: String| ApiError::InvalidEndpoint {
            url: self.endpoint.clone(),
            message,
        };
        let mut url =
            Url::parse(&self.endpoint).map_err(|err| invalid_endpoint(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid_endpoint(String::from("endpoint cannot be used as a base URL")))?
            .pop_if_empty()
            .extend(parts);
        Ok(url.into())
    }

    pub(crate) async fn get_json<T>(&self, url: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let body = self.execute(self.http.get(url), url).await?;
        decode(url, &body)
    }

    pub(crate) async fn post_json<B, T>(&self, url: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(self.http.post(url).json(payload), url).await?;
        decode(url, &body)
    }

    pub(crate) async fn put_json<B, T>(&self, url: &str, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(self.http.put(url).json(payload), url).await?;
        decode(url, &body)
    }

    pub(crate) async fn delete(&self, url: &str) -> Result<(), ApiError> {
        self.execute(self.http.delete(url), url).await.map(|_| ())
    }

    async fn execute(&self, request: RequestBuilder, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = request
            .header(AUTH_TOKEN_HEADER, &self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| ApiError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport {
                message: err.to_string(),
            })?
            .to_vec();

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode {
        url: url.to_owned(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://vpc.example.com/v1/proj", "https://vpc.example.com/v1/proj/")]
    #[case("https://vpc.example.com/v1/proj/", "https://vpc.example.com/v1/proj/")]
    fn new_normalises_trailing_slash(#[case] input: &str, #[case] expected: &str) {
        let client = ServiceClient::new(reqwest::Client::new(), "token", input);
        assert_eq!(client.endpoint(), expected);
    }

    #[test]
    fn service_url_joins_parts() {
        let client = ServiceClient::new(
            reqwest::Client::new(),
            "token",
            "https://vpc.example.com/v1/proj",
        );
        assert_eq!(
            client.service_url(&["publicips", "eip-1"]).ok().as_deref(),
            Some("https://vpc.example.com/v1/proj/publicips/eip-1")
        );
    }

    #[rstest]
    #[case("eip-1?other", "publicips/eip-1%3Fother")]
    #[case("../publicips/eip-1", "publicips/..%2Fpublicips%2Feip-1")]
    #[case("eip#1", "publicips/eip%231")]
    #[case("50%", "publicips/50%25")]
    fn service_url_keeps_identifier_in_one_segment(#[case] id: &str, #[case] suffix: &str) {
        let client = ServiceClient::new(
            reqwest::Client::new(),
            "token",
            "https://vpc.example.com/v1/proj",
        );
        let url = client
            .service_url(&["publicips", id])
            .expect("identifier should encode");
        assert_eq!(url, format!("https://vpc.example.com/v1/proj/{suffix}"));
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    fn service_url_rejects_relative_segments(#[case] id: &str) {
        let client = ServiceClient::new(
            reqwest::Client::new(),
            "token",
            "https://vpc.example.com/v1/proj",
        );
        assert_eq!(
            client.service_url(&["publicips", id]),
            Err(ApiError::InvalidSegment {
                segment: id.to_owned()
            })
        );
    }

    #[test]
    fn service_url_rejects_non_base_endpoint() {
        let client = ServiceClient::new(reqwest::Client::new(), "token", "not a url");
        assert!(matches!(
            client.service_url(&["publicips"]),
            Err(ApiError::InvalidEndpoint { .. })
        ));
    }
}
