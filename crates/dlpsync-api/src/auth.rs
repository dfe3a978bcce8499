// OAuth2 client-credentials token exchange
//
// A tenant is addressed by a service account, an API key, and a TSG
// scope. Exchanging them yields a short-lived bearer token that the
// DLP client attaches to every request.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Production token endpoint.
pub const DEFAULT_AUTH_URL: &str =
    "https://auth.apps.paloaltonetworks.com/auth/v1/oauth2/access_token";

/// Credentials for one tenant.
///
/// The API key is carried as a [`SecretString`] so it never shows up in
/// `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub service_account: String,
    pub api_key: SecretString,
    /// OAuth2 scope, e.g. `tsg_id:1234567890`.
    pub scope: String,
}

impl ClientCredentials {
    /// Credentials scoped to a tenant service group.
    pub fn for_tsg(
        service_account: impl Into<String>,
        api_key: SecretString,
        tsg_id: &str,
    ) -> Self {
        Self {
            service_account: service_account.into(),
            api_key,
            scope: format!("tsg_id:{tsg_id}"),
        }
    }
}

/// A bearer token returned by the token endpoint.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchange client credentials for an access token.
///
/// Sends `grant_type=client_credentials` with the scope as a form body and
/// the service account / API key as HTTP basic auth. Any non-200 answer is
/// an [`Error::Authentication`].
pub async fn request_access_token(
    http: &reqwest::Client,
    auth_url: &Url,
    credentials: &ClientCredentials,
) -> Result<AccessToken, Error> {
    debug!(scope = %credentials.scope, "requesting access token at {auth_url}");

    let form = [
        ("grant_type", "client_credentials"),
        ("scope", credentials.scope.as_str()),
    ];

    let resp = http
        .post(auth_url.clone())
        .basic_auth(
            &credentials.service_account,
            Some(credentials.api_key.expose_secret()),
        )
        .form(&form)
        .send()
        .await?;

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("token exchange failed (HTTP {status}): {body}"),
        });
    }

    let body = resp.text().await?;
    let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("invalid token response: {e}"),
        body: body.clone(),
    })?;

    let token = parsed.access_token.ok_or_else(|| Error::Authentication {
        message: "token response did not contain an access_token".into(),
    })?;

    debug!("access token acquired");
    Ok(AccessToken::new(token))
}
