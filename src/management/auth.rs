use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    management::state::{ClientState, Credential},
    spotify::{CatalogApi, RetryPolicy, execute},
};

/// Refreshes the session's access token when its deadline is unset or past.
///
/// The deadline is re-armed (now + 55 minutes) *before* the refresh runs, so a
/// failed refresh is not retried until the next window. What the refresh does
/// depends on the credential:
///
/// - service, no refresh token: client-credentials grant
/// - service with refresh token: refresh grant authenticated with the secret
/// - user with refresh token and client id: refresh grant without a secret
/// - user without either: nothing, rotation is the caller's business
///
/// Refresh errors are returned unmodified.
pub async fn ensure_fresh(
    state: &mut ClientState,
    api: &dyn CatalogApi,
    policy: &RetryPolicy,
) -> Result<()> {
    let now = Utc::now();
    if !state.needs_refresh(now) {
        return Ok(());
    }

    state.arm_deadline(now);

    match state.credential().clone() {
        Credential::Service {
            client_id,
            client_secret,
            refresh_token: None,
            ..
        } => {
            debug!("requesting client-credentials token");
            let token = execute(policy, "client credentials grant", || {
                api.client_credentials_grant(&client_id, &client_secret)
            })
            .await?;
            state.store_tokens(token.access_token, token.refresh_token);
        }
        Credential::Service {
            client_id,
            client_secret,
            refresh_token: Some(refresh_token),
            ..
        } => {
            debug!("refreshing service token");
            let token = execute(policy, "refresh token", || {
                api.refresh_access_token(&refresh_token, &client_id, Some(&client_secret))
            })
            .await?;
            state.store_tokens(token.access_token, token.refresh_token);
        }
        Credential::User {
            refresh_token: Some(refresh_token),
            client_id: Some(client_id),
            ..
        } => {
            debug!("refreshing user token");
            let token = execute(policy, "refresh token", || {
                api.refresh_access_token(&refresh_token, &client_id, None)
            })
            .await?;
            state.store_tokens(token.access_token, None);
        }
        Credential::User { .. } => {
            debug!("user token has no refresh token or client id, leaving it as is");
        }
    }

    Ok(())
}

/// Shares one [`ClientState`] between concurrent callers.
///
/// The check-and-refresh runs under an async mutex, so callers that arrive
/// while a refresh is in flight wait for it instead of starting their own.
pub struct TokenManager {
    state: Mutex<ClientState>,
}

impl TokenManager {
    pub fn new(state: ClientState) -> Self {
        TokenManager {
            state: Mutex::new(state),
        }
    }

    /// Returns an access token that was refreshed if the deadline required it.
    pub async fn get_valid_token(
        &self,
        api: &dyn CatalogApi,
        policy: &RetryPolicy,
    ) -> Result<String> {
        let mut state = self.state.lock().await;
        let had_deadline = state.refresh_deadline().is_some();

        ensure_fresh(&mut state, api, policy).await?;
        if !had_deadline {
            info!("obtained catalog access token");
        }

        state
            .access_token()
            .map(str::to_owned)
            .ok_or_else(|| Error::Auth {
                message: "no access token available after refresh".into(),
                response: None,
            })
    }

    pub async fn current_state(&self) -> ClientState {
        self.state.lock().await.clone()
    }
}
