//! REST client for the remote key-management service.
//!
//! Implements [`KeyService`] over HTTPS with bearer-token authentication.

use super::protocol::{
    kind_from_http_status, kind_from_status, AsymmetricDecryptRequest,
    AsymmetricDecryptResponse, AsymmetricSignRequest, AsymmetricSignResponse, ErrorResponse,
    PublicKeyResponse,
};
use crate::adapters::key_service::{KeyService, ServiceError, ServiceErrorKind};
use crate::domain::types::KeyPath;
use crate::infra::error::{KmsError, KmsResult};

/// Public endpoint of the Cloud KMS v1 REST API.
pub const DEFAULT_ENDPOINT: &str = "https://cloudkms.googleapis.com/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the key service.
#[derive(Clone)]
pub struct RemoteKeyServiceConfig {
    /// Base URL including the API version, without a trailing slash.
    pub endpoint: String,
    /// OAuth2 bearer token.
    pub access_token: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Whether to verify TLS certificates (should be true in production).
    pub verify_tls: bool,
    /// Additional headers sent with every request.
    pub extra_headers: Vec<(String, String)>,
}

impl RemoteKeyServiceConfig {
    /// Create a configuration for the public endpoint.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: access_token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
            extra_headers: Vec::new(),
        }
    }

    /// Point the client at another endpoint (emulators, private service connect).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Disable TLS verification (for testing only!).
    #[must_use]
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers
            .push((name.to_string(), value.to_string()));
        self
    }
}

// Keep the token out of debug output.
impl std::fmt::Debug for RemoteKeyServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteKeyServiceConfig")
            .field("endpoint", &self.endpoint)
            .field("access_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("verify_tls", &self.verify_tls)
            .field(
                "extra_headers",
                &self
                    .extra_headers
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Key service client speaking the REST API.
pub struct RemoteKeyService {
    config: RemoteKeyServiceConfig,
    client: reqwest::Client,
}

impl RemoteKeyService {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(config: RemoteKeyServiceConfig) -> KmsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| {
                KmsError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &RemoteKeyServiceConfig {
        &self.config
    }

    fn url(&self, key: &KeyPath, suffix: &str) -> String {
        format!("{}/{}{}", self.config.endpoint, key, suffix)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.access_token),
            )
            .header("Accept", "application/json");

        for (name, value) in &self.config.extra_headers {
            builder = builder.header(name, value);
        }
        builder
    }

    /// Send a request and parse the JSON body of a successful response.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = builder.send().await.map_err(|e| {
            ServiceError::new(
                ServiceErrorKind::Transport,
                format!("Failed to reach key service: {e}"),
            )
        })?;

        Self::handle_response(response).await
    }

    /// Handle HTTP response and parse JSON body.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                ServiceError::new(
                    ServiceErrorKind::MalformedResponse,
                    format!("Failed to parse response: {e}"),
                )
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(Self::map_error(status.as_u16(), &error_text))
        }
    }

    /// Map an error response to a [`ServiceError`].
    fn map_error(http_status: u16, body: &str) -> ServiceError {
        if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
            let error = error_response.error;
            let kind = kind_from_status(&error.status)
                .unwrap_or_else(|| kind_from_http_status(error.code));
            return ServiceError::new(kind, error.message);
        }

        ServiceError::new(
            kind_from_http_status(http_status),
            format!("Server error {http_status}: {body}"),
        )
    }
}

impl KeyService for RemoteKeyService {
    async fn get_public_key(&self, key: &KeyPath) -> Result<String, ServiceError> {
        let url = self.url(key, "/publicKey");
        log::debug!("GET {url}");

        let response: PublicKeyResponse =
            self.send(self.request(reqwest::Method::GET, &url)).await?;

        if let Some(algorithm) = &response.algorithm {
            log::debug!("Key {key} reports algorithm {algorithm}");
        }
        Ok(response.pem)
    }

    async fn asymmetric_decrypt(
        &self,
        key: &KeyPath,
        ciphertext_b64: &str,
    ) -> Result<String, ServiceError> {
        let url = self.url(key, ":asymmetricDecrypt");
        log::debug!("POST {url} (ciphertext: {} base64 chars)", ciphertext_b64.len());

        let request = AsymmetricDecryptRequest {
            ciphertext: ciphertext_b64.to_string(),
        };
        let response: AsymmetricDecryptResponse = self
            .send(self.request(reqwest::Method::POST, &url).json(&request))
            .await?;
        Ok(response.plaintext)
    }

    async fn asymmetric_sign(
        &self,
        key: &KeyPath,
        digest_sha256_b64: &str,
    ) -> Result<String, ServiceError> {
        let url = self.url(key, ":asymmetricSign");
        log::debug!("POST {url}");

        let request = AsymmetricSignRequest::sha256(digest_sha256_b64);
        let response: AsymmetricSignResponse = self
            .send(self.request(reqwest::Method::POST, &url).json(&request))
            .await?;
        Ok(response.signature)
    }
}
