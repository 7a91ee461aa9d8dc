use crate::api::{ApiClient, ApiError, Method, LOGIN_PATH};
use crate::models::{LoginRequest, TokenResponse, User};
use crate::storage::{Storage, StorageError, TOKEN_KEY, USER_KEY};
use thiserror::Error;
use tracing::{debug, info, warn};

/// The logged-in user, if any, together with the client used to talk to the
/// backend on their behalf
#[derive(Debug)]
pub(crate) struct Session<S> {
    client: ApiClient<S>,
    user: Option<User>,
}

impl<S: Storage> Session<S> {
    /// Picks up a login persisted by an earlier run.  A token without a user
    /// record, or the reverse, counts as logged out, and an unreadable user
    /// record is discarded along with its token.  Storage that cannot be
    /// parsed at all is wiped.
    pub(crate) fn restore(client: ApiClient<S>) -> Result<Session<S>, StorageError> {
        let storage = client.storage();
        let saved = match read_saved(storage) {
            Ok(saved) => saved,
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!(error = %e, "discarding unreadable session storage");
                storage.reset()?;
                (None, None)
            }
            Err(e) => return Err(e),
        };
        let user = match saved {
            (Some(_), Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    info!(email = %user.email, "restored saved session");
                    Some(user)
                }
                Err(e) => {
                    warn!(error = %e, "discarding unreadable saved user record");
                    storage.remove(TOKEN_KEY)?;
                    storage.remove(USER_KEY)?;
                    None
                }
            },
            _ => None,
        };
        Ok(Session { client, user })
    }

    pub(crate) fn client(&self) -> &ApiClient<S> {
        &self.client
    }

    pub(crate) fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub(crate) fn ensure_authenticated(&self) -> Result<&User, SessionError> {
        self.user.as_ref().ok_or(SessionError::NotLoggedIn)
    }

    pub(crate) fn login(&mut self, email: &str, password: &str) -> Result<&User, SessionError> {
        let request = LoginRequest { email, password };
        let response = self
            .client
            .send_json::<_, TokenResponse>(Method::POST, LOGIN_PATH, &request)
            .map_err(|e| match e {
                ApiError::Unauthorized => SessionError::InvalidCredentials,
                ApiError::Network(source) => SessionError::Network(source),
                ApiError::Status {
                    message: Some(message),
                    ..
                } => SessionError::Server(message),
                e => SessionError::Api(e),
            })?;
        debug!(token_type = ?response.token_type, "received login token");
        let user = response.user();
        let record = serde_json::to_string(&user).map_err(SessionError::Encode)?;
        let storage = self.client.storage();
        storage.set(TOKEN_KEY, &response.token)?;
        storage.set(USER_KEY, &record)?;
        info!(email = %user.email, kind = %user.kind, "logged in");
        Ok(self.user.insert(user))
    }

    pub(crate) fn logout(&mut self) -> Result<(), StorageError> {
        let storage = self.client.storage();
        storage.remove(TOKEN_KEY)?;
        storage.remove(USER_KEY)?;
        if let Some(user) = self.user.take() {
            info!(email = %user.email, "logged out");
        }
        Ok(())
    }

    /// Drops the in-memory user if the stored token has gone away, as happens
    /// when the server rejects it
    pub(crate) fn refresh(&mut self) -> Result<(), StorageError> {
        if self.user.is_some() && self.client.storage().get(TOKEN_KEY)?.is_none() {
            info!("stored session was cleared; now logged out");
            self.user = None;
        }
        Ok(())
    }
}

fn read_saved<S: Storage>(storage: &S) -> Result<(Option<String>, Option<String>), StorageError> {
    Ok((storage.get(TOKEN_KEY)?, storage.get(USER_KEY)?))
}

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("not logged in; run `osagenda login <email>` first")]
    NotLoggedIn,
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("could not reach the server")]
    Network(#[source] reqwest::Error),
    #[error("login failed: {0}")]
    Server(String),
    #[error("login failed")]
    Api(#[source] ApiError),
    #[error("failed to encode user record")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
