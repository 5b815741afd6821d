// iControl REST HTTP client
//
// Wraps `reqwest::Client` with BIG-IP-specific URL construction, auth
// token handling, and error envelope parsing. All endpoint families
// (ltm, net, sys, gtm) are implemented as inherent methods via separate
// files to keep this module focused on transport mechanics.

use std::sync::RwLock;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::rest::models::{LoginRequest, LoginResponse, RestErrorBody};
use crate::transport::TransportConfig;

/// Raw HTTP client for the BIG-IP iControl REST API.
///
/// Handles token-based authentication (`X-F5-Auth-Token`), `/mgmt/...`
/// URL construction, and the uniform error envelope: any response body
/// carrying `code` and `message` fields is surfaced as [`Error::RestApi`]
/// with the device's message verbatim.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    /// Auth token for iControl REST. Captured from the login response and
    /// sent on every subsequent request.
    token: RwLock<Option<String>>,
}

impl RestClient {
    /// Create a new REST client from a `TransportConfig`.
    ///
    /// The `base_url` should be the management root
    /// (e.g. `https://192.168.1.245` or `https://bigip.example.com:8443`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Create a REST client with a pre-built `reqwest::Client`.
    ///
    /// Use this in tests or when the transport needs custom middleware.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(None),
        }
    }

    /// The management base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange credentials for an auth token.
    ///
    /// `POST /mgmt/shared/authn/login` -- on success the returned token is
    /// stored and applied to every subsequent request.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), Error> {
        let url = self.mgmt_url("shared/authn/login");
        debug!(username = %credentials.username, "logging in");

        let body = LoginRequest {
            username: &credentials.username,
            password: credentials.password.expose_secret(),
            login_provider_name: &credentials.login_provider,
        };

        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "invalid credentials".into(),
            });
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<RestErrorBody>(&text)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(Error::Authentication { message });
        }

        let login: LoginResponse = resp.json().await.map_err(Error::Transport)?;
        *self.token.write().expect("token lock poisoned") = Some(login.token.token);
        debug!("auth token acquired");
        Ok(())
    }

    /// Invalidate the stored auth token on the device.
    ///
    /// `DELETE /mgmt/shared/authz/tokens/{token}` -- a no-op if no token
    /// is held. The local token is cleared regardless of the outcome.
    pub async fn logout(&self) -> Result<(), Error> {
        let token = self.token.write().expect("token lock poisoned").take();
        let Some(token) = token else {
            return Ok(());
        };
        let url = self.mgmt_url(&format!("shared/authz/tokens/{token}"));
        debug!("revoking auth token");
        let _ = self.http.delete(url).send().await.map_err(Error::Transport)?;
        Ok(())
    }

    /// Returns `true` if a login token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    /// Apply the stored auth token to a request builder.
    fn apply_token(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let guard = self.token.read().expect("token lock poisoned");
        match guard.as_deref() {
            Some(token) => builder.header("X-F5-Auth-Token", token),
            None => builder,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a management API path: `{base}/mgmt/{path}`
    pub(crate) fn mgmt_url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/mgmt/{path}");
        Url::parse(&full).expect("invalid API URL")
    }

    /// Build a traffic-management URL: `{base}/mgmt/tm/{path}`
    ///
    /// All configuration objects live under `/mgmt/tm/`: ltm profiles,
    /// net vlans, sys db variables, gtm monitors.
    pub(crate) fn tm_url(&self, path: &str) -> Url {
        self.mgmt_url(&format!("tm/{path}"))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the response.
    #[allow(dead_code)]
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self
            .apply_token(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;
        self.parse_response(resp).await
    }

    /// Send a GET request, mapping "object does not exist" to `None`.
    ///
    /// The appliance signals a missing object either as HTTP 404 or as an
    /// HTTP 200 whose body carries `"code": 404`.
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Option<T>, Error> {
        debug!("GET {}", url);
        let resp = self
            .apply_token(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;
        match self.parse_response(resp).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Send a POST request with JSON body and decode the response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .apply_token(self.http.post(url).json(body))
            .send()
            .await
            .map_err(Error::Transport)?;
        self.parse_response(resp).await
    }

    /// Send a PATCH request with JSON body and decode the response.
    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PATCH {}", url);
        let resp = self
            .apply_token(self.http.patch(url).json(body))
            .send()
            .await
            .map_err(Error::Transport)?;
        self.parse_response(resp).await
    }

    /// Send a DELETE request, expecting an empty-ish success response.
    pub(crate) async fn delete(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let resp = self
            .apply_token(self.http.delete(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "auth token rejected".into(),
            });
        }
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(rest_error(status.as_u16(), &body))
    }

    /// Decode a response body, surfacing the appliance's error envelope.
    ///
    /// Errors are detected both by HTTP status and by a `code` field in
    /// the body -- some endpoints report failures inside an HTTP 200.
    /// A `message` field is surfaced verbatim; malformed JSON on a
    /// success response raises immediately.
    async fn parse_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "auth token expired or credentials invalid".into(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        if let Ok(envelope) = serde_json::from_str::<RestErrorBody>(&body) {
            if let Some(code) = envelope.code {
                if code >= 400 {
                    return Err(match envelope.message {
                        Some(message) => Error::RestApi {
                            status: code,
                            message,
                        },
                        None => rest_error(code, &body),
                    });
                }
            }
        }

        if !status.is_success() {
            return Err(rest_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}

/// Build a `RestApi` error from a raw body, preferring the device's
/// `message` field when one is present.
fn rest_error(status: u16, body: &str) -> Error {
    if let Ok(envelope) = serde_json::from_str::<RestErrorBody>(body) {
        if let Some(message) = envelope.message {
            return Error::RestApi { status, message };
        }
    }
    let preview = &body[..body.len().min(200)];
    Error::RestApi {
        status,
        message: format!("HTTP {status}: {preview}"),
    }
}
