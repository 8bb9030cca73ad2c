/// OAuth authorization-code exchange
///
/// The identity provider is an external collaborator: the frontend completes
/// the browser flow and hands the backend an authorization code. This module
/// performs the two server-side calls of the flow (code to token, token to
/// userinfo) and hands back a normalized profile. Provider
/// endpoints and client credentials come from configuration, so any
/// standards-compliant provider works.

use serde::{Deserialize, Serialize};

/// Error type for the OAuth exchange
#[derive(Debug, thiserror::Error)]
pub enum OauthError {
    /// Provider rejected the authorization code
    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    /// Userinfo endpoint rejected the access token or returned garbage
    #[error("Profile fetch failed: {0}")]
    ProfileFailed(String),

    /// Provider profile carries no email; an account cannot be keyed
    #[error("Provider profile has no email address")]
    MissingEmail,

    /// Transport-level failure
    #[error("OAuth request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Provider endpoints and client credentials
#[derive(Debug, Clone)]
pub struct OauthConfig {
    /// Token endpoint URL
    pub token_url: String,

    /// Userinfo endpoint URL
    pub userinfo_url: String,

    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Redirect URI registered with the provider
    pub redirect_uri: String,
}

/// Normalized user profile from the provider
#[derive(Debug, Clone, Deserialize)]
pub struct OauthProfile {
    /// Email address; required, used as the account key
    pub email: String,

    /// Display name, if the provider shares one
    pub name: Option<String>,

    /// Avatar URL, if the provider shares one
    #[serde(alias = "picture")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the identity provider
#[derive(Debug, Clone)]
pub struct OauthClient {
    http: reqwest::Client,
    config: OauthConfig,
}

impl OauthClient {
    /// Creates a client with the given provider configuration
    pub fn new(config: OauthConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Exchanges an authorization code for the provider profile
    ///
    /// Runs both legs of the server-side flow and validates that the
    /// resulting profile carries an email address.
    pub async fn exchange_code(&self, code: &str) -> Result<OauthProfile, OauthError> {
        let token = self.fetch_token(code).await?;
        let profile = self.fetch_profile(&token).await?;

        if profile.email.trim().is_empty() {
            return Err(OauthError::MissingEmail);
        }

        Ok(profile)
    }

    async fn fetch_token(&self, code: &str) -> Result<String, OauthError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&TokenRequest {
                grant_type: "authorization_code",
                code,
                client_id: &self.config.client_id,
                client_secret: &self.config.client_secret,
                redirect_uri: &self.config.redirect_uri,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OauthError::ExchangeFailed(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OauthError::ExchangeFailed(format!("Malformed token response: {}", e)))?;

        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<OauthProfile, OauthError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OauthError::ProfileFailed(format!(
                "Userinfo returned {}",
                response.status()
            )));
        }

        let profile: OauthProfile = response
            .json()
            .await
            .map_err(|e| OauthError::ProfileFailed(format!("Malformed profile: {}", e)))?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_picture_alias() {
        let profile: OauthProfile = serde_json::from_str(
            r#"{"email": "dev@example.com", "name": "Ada", "picture": "https://example.com/a.png"}"#,
        )
        .unwrap();

        assert_eq!(profile.email, "dev@example.com");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn test_profile_tolerates_missing_optionals() {
        let profile: OauthProfile =
            serde_json::from_str(r#"{"email": "dev@example.com"}"#).unwrap();

        assert!(profile.name.is_none());
        assert!(profile.avatar_url.is_none());
    }
}
