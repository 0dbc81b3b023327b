use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};

/// How long an access token is trusted before it is refreshed.
pub const REFRESH_INTERVAL_MINUTES: i64 = 55;

/// The credentials a session authenticates with.
#[derive(Debug, Clone, PartialEq)]
pub enum Credential {
    /// Application credentials, exchanged through the client-credentials grant.
    Service {
        client_id: String,
        client_secret: String,
        access_token: Option<String>,
        refresh_token: Option<String>,
    },
    /// A user access token obtained elsewhere, optionally refreshable.
    User {
        access_token: String,
        refresh_token: Option<String>,
        client_id: Option<String>,
    },
}

/// Current credentials plus the moment they must next be refreshed.
///
/// One `ClientState` belongs to one logical session. The deadline is only
/// moved by the credential manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientState {
    credential: Credential,
    refresh_deadline: Option<DateTime<Utc>>,
}

impl ClientState {
    /// Validates `credential` and arms the deadline for user tokens.
    ///
    /// # Errors
    ///
    /// `Error::CredentialsIncomplete` when a required field is empty.
    pub fn new(credential: Credential) -> Result<Self> {
        let refresh_deadline = match &credential {
            Credential::Service {
                client_id,
                client_secret,
                ..
            } => {
                if client_id.is_empty() || client_secret.is_empty() {
                    return Err(Error::CredentialsIncomplete(
                        "service credentials need both a client id and a client secret".into(),
                    ));
                }
                None
            }
            Credential::User { access_token, .. } => {
                if access_token.is_empty() {
                    return Err(Error::CredentialsIncomplete(
                        "user credentials need an access token".into(),
                    ));
                }
                Some(Utc::now() + refresh_interval())
            }
        };

        Ok(Self {
            credential,
            refresh_deadline,
        })
    }

    pub fn service(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Self::new(Credential::Service {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: None,
            refresh_token: None,
        })
    }

    pub fn user(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        client_id: Option<String>,
    ) -> Result<Self> {
        Self::new(Credential::User {
            access_token: access_token.into(),
            refresh_token: refresh_token.filter(|t| !t.is_empty()),
            client_id: client_id.filter(|c| !c.is_empty()),
        })
    }

    /// Builds a session from loosely supplied parts.
    ///
    /// A non-empty access token selects a user credential. Otherwise both the
    /// client id and secret must be present for a service credential.
    pub fn from_parts(
        client_id: Option<String>,
        client_secret: Option<String>,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());

        match (
            present(access_token),
            present(client_id),
            present(client_secret),
        ) {
            (Some(access_token), client_id, _) => {
                Self::user(access_token, refresh_token, client_id)
            }
            (None, Some(client_id), Some(client_secret)) => {
                let mut state = Self::service(client_id, client_secret)?;
                if let Credential::Service {
                    refresh_token: stored,
                    ..
                } = &mut state.credential
                {
                    *stored = present(refresh_token);
                }
                Ok(state)
            }
            _ => Err(Error::CredentialsIncomplete(
                "provide an access token or a client id and secret".into(),
            )),
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn access_token(&self) -> Option<&str> {
        match &self.credential {
            Credential::Service { access_token, .. } => access_token.as_deref(),
            Credential::User { access_token, .. } => Some(access_token),
        }
    }

    pub fn refresh_deadline(&self) -> Option<DateTime<Utc>> {
        self.refresh_deadline
    }

    /// True when no deadline is armed or it has passed.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.refresh_deadline.is_none_or(|deadline| now >= deadline)
    }

    /// Clears the deadline so the next freshness check refreshes.
    pub fn invalidate(&mut self) {
        self.refresh_deadline = None;
    }

    pub(crate) fn arm_deadline(&mut self, now: DateTime<Utc>) {
        self.refresh_deadline = Some(now + refresh_interval());
    }

    /// Stores a freshly granted access token, and a rotated refresh token when
    /// the service issued one.
    pub(crate) fn store_tokens(&mut self, access: String, refresh: Option<String>) {
        match &mut self.credential {
            Credential::Service {
                access_token,
                refresh_token,
                ..
            } => {
                *access_token = Some(access);
                if let Some(refresh) = refresh.filter(|r| !r.is_empty()) {
                    *refresh_token = Some(refresh);
                }
            }
            Credential::User { access_token, .. } => *access_token = access,
        }
    }
}

fn refresh_interval() -> Duration {
    Duration::minutes(REFRESH_INTERVAL_MINUTES)
}
