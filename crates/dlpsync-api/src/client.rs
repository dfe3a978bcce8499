// Async HTTP client for the DLP data-pattern and data-profile endpoints.
//
// Auth: `Authorization: Bearer <token>` plus two fixed client-identity
// headers, injected as default headers on the underlying reqwest client.

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::auth::{AccessToken, ClientCredentials, request_access_token};
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{ListEnvelope, ProfileEnvelope};

/// Production data-pattern collection.
pub const DEFAULT_DATA_PATTERN_URL: &str =
    "https://api.dlp.paloaltonetworks.com/v1/api/data-pattern";

/// Production data-profile collection.
pub const DEFAULT_DATA_PROFILE_URL: &str =
    "https://api.dlp.paloaltonetworks.com/v1/api/data-profile";

/// Value of the `client-name` and `service-name` identity headers.
pub const CLIENT_IDENTITY: &str = "dlp-micro-app";

/// Collection URLs for one DLP deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub data_pattern_url: Url,
    pub data_profile_url: Url,
}

impl Endpoints {
    pub fn new(data_pattern_url: &str, data_profile_url: &str) -> Result<Self, Error> {
        Ok(Self {
            data_pattern_url: Url::parse(data_pattern_url)?,
            data_profile_url: Url::parse(data_profile_url)?,
        })
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATTERN_URL, DEFAULT_DATA_PROFILE_URL)
            .unwrap_or_else(|_| unreachable!("default endpoints are valid URLs"))
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one tenant's DLP API.
///
/// All listing and mutation methods speak raw JSON: the caller owns the
/// entity schema. Profile mutations are wrapped in the `dataProfile`
/// envelope here so callers never see it.
pub struct DlpClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl DlpClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Exchange credentials for a token and build an authenticated client.
    pub async fn connect(
        auth_url: &Url,
        credentials: &ClientCredentials,
        endpoints: Endpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let bootstrap = transport.build_client()?;
        let token = request_access_token(&bootstrap, auth_url, credentials).await?;
        Self::from_token(&token, endpoints, transport)
    }

    /// Build from an already-acquired bearer token.
    pub fn from_token(
        token: &AccessToken,
        endpoints: Endpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose())).map_err(
            |e| Error::Authentication {
                message: format!("invalid access token header value: {e}"),
            },
        )?;
        bearer.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("client-name", HeaderValue::from_static(CLIENT_IDENTITY));
        headers.insert("service-name", HeaderValue::from_static(CLIENT_IDENTITY));

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, endpoints })
    }

    // ── Data patterns ────────────────────────────────────────────────

    /// List every data pattern, predefined ones included.
    pub async fn list_data_patterns(&self) -> Result<Vec<Value>, Error> {
        self.list(self.endpoints.data_pattern_url.clone()).await
    }

    pub async fn create_data_pattern(&self, body: &Value) -> Result<Value, Error> {
        let url = self.endpoints.data_pattern_url.clone();
        debug!("POST {url}");
        let resp = self.http.post(url).json(body).send().await?;
        handle_response(resp, &[StatusCode::OK, StatusCode::CREATED], "created")
            .await
    }

    pub async fn update_data_pattern(&self, id: &str, body: &Value) -> Result<Value, Error> {
        let url = member_url(&self.endpoints.data_pattern_url, id)?;
        self.put(url, body).await
    }

    // ── Data profiles ────────────────────────────────────────────────

    /// List every data profile, predefined ones included.
    pub async fn list_data_profiles(&self) -> Result<Vec<Value>, Error> {
        self.list(self.endpoints.data_profile_url.clone()).await
    }

    /// Create a data profile. The API expects `POST <profiles>/create`.
    pub async fn create_data_profile(&self, body: &Value) -> Result<Value, Error> {
        let url = member_url(&self.endpoints.data_profile_url, "create")?;
        debug!("POST {url}");
        let envelope = ProfileEnvelope { data_profile: body };
        let resp = self.http.post(url).json(&envelope).send().await?;
        handle_response(resp, &[StatusCode::OK, StatusCode::CREATED], "created")
            .await
    }

    pub async fn update_data_profile(&self, id: &str, body: &Value) -> Result<Value, Error> {
        let url = member_url(&self.endpoints.data_profile_url, id)?;
        self.put(url, &ProfileEnvelope { data_profile: body }).await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn list(&self, url: Url) -> Result<Vec<Value>, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(parse_error(status, resp).await);
        }
        let body = resp.text().await?;
        let envelope: ListEnvelope = parse_body(&body)?;
        Ok(envelope.into_resources())
    }

    async fn put<B: Serialize + Sync>(&self, url: Url, body: &B) -> Result<Value, Error> {
        debug!("PUT {url}");
        let resp = self.http.put(url).json(body).send().await?;
        handle_response(resp, &[StatusCode::OK, StatusCode::NO_CONTENT], "updated")
            .await
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Accept only the listed statuses. An empty success body becomes
/// `{"status": <empty_status>}`.
async fn handle_response(
    resp: reqwest::Response,
    accepted: &[StatusCode],
    empty_status: &str,
) -> Result<Value, Error> {
    let status = resp.status();
    if !accepted.contains(&status) {
        return Err(parse_error(status, resp).await);
    }
    let body = resp.text().await?;
    if body.trim().is_empty() {
        return Ok(json!({ "status": empty_status }));
    }
    parse_body(&body)
}

async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        return Error::InvalidToken;
    }
    let raw = resp.text().await.unwrap_or_default();
    Error::Api {
        status: status.as_u16(),
        message: if raw.is_empty() {
            status.to_string()
        } else {
            raw
        },
    }
}

/// `<collection>/<segment>`, with the segment percent-encoded.
fn member_url(collection: &Url, segment: &str) -> Result<Url, Error> {
    let mut url = collection.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
