//! Service-account authentication for Google APIs.
//!
//! A signed JWT assertion is exchanged at the key's token endpoint for a
//! short-lived bearer token.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::error::ProxyError;

/// Read-only access to Search Console data.
pub const SEARCH_CONSOLE_SCOPE: &str = "https://www.googleapis.com/auth/webmasters.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error("service account JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("service account JSON has no {0}")]
    MissingField(&'static str),

    #[error("service account private key is not a valid RSA key: {0}")]
    PrivateKey(jsonwebtoken::errors::Error),
}

/// The fields of a service-account key file that token exchange needs.
#[derive(Debug, Deserialize)]
struct KeyFile {
    #[serde(default)]
    client_email: String,
    #[serde(default)]
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

/// A parsed service account, ready to sign assertions.
pub struct ServiceAccount {
    client_email: String,
    token_uri: String,
    key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccount {
    /// Parse the contents of a service-account key file.
    pub fn from_json(json: &str) -> Result<Self, CredentialsError> {
        let file: KeyFile = serde_json::from_str(json)?;

        if file.client_email.trim().is_empty() {
            return Err(CredentialsError::MissingField("client_email"));
        }
        if file.private_key.trim().is_empty() {
            return Err(CredentialsError::MissingField("private_key"));
        }

        let key = EncodingKey::from_rsa_pem(file.private_key.as_bytes())
            .map_err(CredentialsError::PrivateKey)?;

        Ok(Self {
            client_email: file.client_email,
            token_uri: file
                .token_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            key,
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Sign a JWT-bearer assertion for `scope`, issued at `issued_at`.
    fn assertion(&self, scope: &str, issued_at: i64) -> Result<String, ProxyError> {
        let claims = Claims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.key,
        )?)
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn access_token(
        &self,
        client: &reqwest::Client,
        scope: &str,
    ) -> Result<String, ProxyError> {
        let assertion = self.assertion(scope, Utc::now().timestamp())?;

        let response = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProxyError::from_response(response).await);
        }

        let token: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(token.access_token)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::proxy::test_support::{client, spawn_upstream};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::json;
    use std::collections::HashMap;

    pub(crate) const TEST_PRIVATE_KEY: &str = include_str!("testdata/test_key.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("testdata/test_key.pub.pem");

    /// A key file for `token_uri`, in the shape Google issues them.
    pub(crate) fn key_json(token_uri: &str) -> String {
        json!({
            "type": "service_account",
            "project_id": "fence-site",
            "client_email": "reporter@fence-site.iam.gserviceaccount.com",
            "private_key": TEST_PRIVATE_KEY,
            "token_uri": token_uri,
        })
        .to_string()
    }

    /// Token endpoint that checks the grant type and verifies the assertion.
    pub(crate) fn fake_token_endpoint() -> Router {
        async fn token(Form(form): Form<HashMap<String, String>>) -> Json<serde_json::Value> {
            if form.get("grant_type").map(String::as_str) != Some(JWT_BEARER_GRANT) {
                return Json(json!({ "error": "unsupported_grant_type" }));
            }
            let Some(assertion) = form.get("assertion") else {
                return Json(json!({ "error": "invalid_request" }));
            };
            let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
            let mut validation = Validation::new(Algorithm::RS256);
            validation.validate_aud = false;
            match jsonwebtoken::decode::<serde_json::Value>(assertion, &key, &validation) {
                Ok(data) => Json(json!({
                    "access_token": format!("token-for-{}", data.claims["iss"].as_str().unwrap_or("")),
                    "expires_in": 3600,
                    "token_type": "Bearer",
                })),
                Err(_) => Json(json!({ "error": "invalid_grant" })),
            }
        }

        Router::new().route("/token", post(token))
    }

    #[test]
    fn test_from_json_requires_fields() {
        let err = ServiceAccount::from_json("{}").unwrap_err();
        assert!(matches!(err, CredentialsError::MissingField("client_email")));

        let err = ServiceAccount::from_json(r#"{"client_email": "a@b.c"}"#).unwrap_err();
        assert!(matches!(err, CredentialsError::MissingField("private_key")));

        let err = ServiceAccount::from_json("not json").unwrap_err();
        assert!(matches!(err, CredentialsError::Parse(_)));
    }

    #[test]
    fn test_from_json_rejects_bad_key() {
        let json = json!({ "client_email": "a@b.c", "private_key": "not a pem" }).to_string();
        let err = ServiceAccount::from_json(&json).unwrap_err();
        assert!(matches!(err, CredentialsError::PrivateKey(_)));
    }

    #[test]
    fn test_default_token_uri() {
        let json = json!({
            "client_email": "a@b.c",
            "private_key": TEST_PRIVATE_KEY,
        })
        .to_string();
        let account = ServiceAccount::from_json(&json).unwrap();
        assert_eq!(account.token_uri(), "https://oauth2.googleapis.com/token");
        assert_eq!(account.client_email(), "a@b.c");
    }

    #[test]
    fn test_assertion_claims() {
        let account = ServiceAccount::from_json(&key_json("https://auth.test/token")).unwrap();
        let jwt = account.assertion(SEARCH_CONSOLE_SCOPE, 1_700_000_000).unwrap();

        let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.set_audience(&["https://auth.test/token"]);
        let data = jsonwebtoken::decode::<serde_json::Value>(&jwt, &key, &validation).unwrap();

        assert_eq!(data.header.alg, Algorithm::RS256);
        assert_eq!(
            data.claims["iss"],
            "reporter@fence-site.iam.gserviceaccount.com"
        );
        assert_eq!(data.claims["scope"], SEARCH_CONSOLE_SCOPE);
        assert_eq!(data.claims["iat"], 1_700_000_000);
        assert_eq!(data.claims["exp"], 1_700_003_600);
    }

    #[tokio::test]
    async fn test_access_token_exchange() {
        let base = spawn_upstream(fake_token_endpoint()).await;
        let account = ServiceAccount::from_json(&key_json(&format!("{base}/token"))).unwrap();

        let token = account
            .access_token(&client(), SEARCH_CONSOLE_SCOPE)
            .await
            .unwrap();
        assert_eq!(token, "token-for-reporter@fence-site.iam.gserviceaccount.com");
    }

    #[tokio::test]
    async fn test_access_token_rejected() {
        let app = Router::new().route(
            "/token",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_grant" })),
                )
            }),
        );
        let base = spawn_upstream(app).await;
        let account = ServiceAccount::from_json(&key_json(&format!("{base}/token"))).unwrap();

        let err = account
            .access_token(&client(), SEARCH_CONSOLE_SCOPE)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamStatus { status: 400, .. }));
    }
}
