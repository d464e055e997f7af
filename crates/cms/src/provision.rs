//! One-off admin provisioning for a fresh CMS instance.
//!
//! Polls the login endpoint until the CMS is up and accepts the admin
//! credentials, then stores a static API token on the admin user. Running it
//! again against a provisioned CMS sets the same token.

use std::time::Duration;

use serde::Deserialize;
use sift_config::CmsConfig;
use tracing::{debug, info};

use crate::{CmsError, http_client};

#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub host: String,
    pub email: String,
    pub password: String,
    pub static_token: String,
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl ProvisionSettings {
    /// The static token falls back to the app's CMS API key, so feedback
    /// submission works against the provisioned instance without extra setup.
    pub fn from_config(config: &CmsConfig) -> Result<Self, CmsError> {
        let password = config
            .admin_password
            .clone()
            .ok_or(CmsError::Missing("admin_password"))?;
        let static_token = config
            .admin_static_token
            .clone()
            .or_else(|| config.api_key.clone())
            .filter(|t| !t.is_empty())
            .ok_or(CmsError::Missing("admin_static_token"))?;

        Ok(Self {
            host: config.host.trim_end_matches('/').to_string(),
            email: config.admin_email.clone(),
            password,
            static_token,
            max_attempts: config.provision_max_attempts.max(1),
            poll_interval: Duration::from_secs(1),
        })
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    data: LoginData,
}

#[derive(Deserialize)]
struct LoginData {
    access_token: String,
}

/// Log in as admin (retrying once per poll interval) and set the static token.
pub async fn provision_admin_token(settings: &ProvisionSettings) -> Result<(), CmsError> {
    let client = http_client()?;
    let access_token = wait_for_login(&client, settings).await?;

    info!(host = %settings.host, "Setting admin static token");
    let response = client
        .patch(format!("{}/users/me", settings.host))
        .bearer_auth(&access_token)
        .json(&serde_json::json!({ "token": settings.static_token }))
        .send()
        .await
        .map_err(|e| CmsError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CmsError::Api {
            status: status.as_u16(),
            body,
        });
    }

    info!("CMS admin provisioned");
    Ok(())
}

async fn wait_for_login(
    client: &reqwest::Client,
    settings: &ProvisionSettings,
) -> Result<String, CmsError> {
    let url = format!("{}/auth/login", settings.host);
    let credentials = serde_json::json!({
        "email": settings.email,
        "password": settings.password,
    });

    for attempt in 1..=settings.max_attempts {
        info!(attempt, "Polling CMS login");
        match client.post(&url).json(&credentials).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                let login: LoginResponse = response
                    .json()
                    .await
                    .map_err(|e| CmsError::Decode(e.to_string()))?;
                return Ok(login.data.access_token);
            }
            Ok(response) => debug!(status = response.status().as_u16(), "CMS not ready"),
            Err(e) => debug!(error = %e, "CMS unreachable"),
        }

        if attempt < settings.max_attempts {
            tokio::time::sleep(settings.poll_interval).await;
        }
    }

    Err(CmsError::LoginTimeout {
        attempts: settings.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{patch, post};
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeCms {
        logins: AtomicU32,
        ready_after: u32,
        patched: Mutex<Option<(String, serde_json::Value)>>,
    }

    fn fake_cms(state: Arc<FakeCms>) -> Router {
        Router::new()
            .route(
                "/auth/login",
                post(|State(cms): State<Arc<FakeCms>>, Json(body): Json<serde_json::Value>| async move {
                    let n = cms.logins.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < cms.ready_after || body["password"] != "secret" {
                        return (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({})));
                    }
                    (
                        StatusCode::OK,
                        Json(serde_json::json!({"data": {"access_token": "session-abc"}})),
                    )
                }),
            )
            .route(
                "/users/me",
                patch(
                    |State(cms): State<Arc<FakeCms>>,
                     headers: HeaderMap,
                     Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        *cms.patched.lock().unwrap() = Some((auth, body));
                        Json(serde_json::json!({"data": {}}))
                    },
                ),
            )
            .with_state(state)
    }

    fn settings(host: String, max_attempts: u32) -> ProvisionSettings {
        ProvisionSettings {
            host,
            email: "admin@example.com".into(),
            password: "secret".into(),
            static_token: "static-token".into(),
            max_attempts,
            poll_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn polls_until_login_succeeds_then_sets_token() {
        let state = Arc::new(FakeCms {
            ready_after: 3,
            ..Default::default()
        });
        let host = serve(fake_cms(state.clone())).await;

        provision_admin_token(&settings(host, 10)).await.unwrap();

        assert_eq!(state.logins.load(Ordering::SeqCst), 3);
        let (auth, body) = state.patched.lock().unwrap().clone().unwrap();
        assert_eq!(auth, "Bearer session-abc");
        assert_eq!(body["token"], "static-token");
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let state = Arc::new(FakeCms {
            ready_after: 100,
            ..Default::default()
        });
        let host = serve(fake_cms(state.clone())).await;

        let err = provision_admin_token(&settings(host, 4)).await.unwrap_err();
        assert!(matches!(err, CmsError::LoginTimeout { attempts: 4 }));
        assert_eq!(state.logins.load(Ordering::SeqCst), 4);
        assert!(state.patched.lock().unwrap().is_none());
    }

    #[test]
    fn settings_fall_back_to_api_key_for_token() {
        let mut config = CmsConfig::default();
        config.admin_password = Some("pw".into());
        config.api_key = Some("app-key".into());
        let settings = ProvisionSettings::from_config(&config).unwrap();
        assert_eq!(settings.static_token, "app-key");
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn settings_require_password() {
        let mut config = CmsConfig::default();
        config.admin_password = None;
        config.api_key = Some("app-key".into());
        assert!(matches!(
            ProvisionSettings::from_config(&config),
            Err(CmsError::Missing("admin_password"))
        ));
    }
}
