//! Who the current user is.
//!
//! A session is authenticated only when both a bearer token and a user id
//! are stored. Otherwise every operation is scoped to the fixed anonymous id.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::storage::KvStore;

pub const ANONYMOUS_USER_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const TOKEN_KEY: &str = "auth_token";
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub is_authenticated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    token: Option<String>,
    user_id: Option<String>,
}

impl SessionIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user_id: Some(user_id.into()),
        }
    }

    /// Read the stored credentials. Unreadable storage means anonymous.
    pub fn load(store: &impl KvStore) -> Self {
        let read = |key: &str| match store.get(key) {
            Ok(v) => v.filter(|s| !s.is_empty()),
            Err(e) => {
                warn!(key, "failed to read identity: {e}");
                None
            }
        };
        match (read(TOKEN_KEY), read(USER_ID_KEY)) {
            (Some(token), Some(user_id)) => Self::authenticated(token, user_id),
            _ => Self::anonymous(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user_id.is_some()
    }

    /// The stored id when authenticated, the anonymous id otherwise.
    pub fn user_id(&self) -> &str {
        match (&self.token, &self.user_id) {
            (Some(_), Some(id)) => id,
            _ => ANONYMOUS_USER_ID,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.user_id().to_string(),
            is_authenticated: self.is_authenticated(),
        }
    }

    /// Store credentials and switch to them. The in-memory identity changes
    /// even if persisting fails.
    pub fn set_session(
        &mut self,
        store: &impl KvStore,
        token: impl Into<String>,
        user_id: impl Into<String>,
    ) {
        *self = Self::authenticated(token, user_id);
        for (key, value) in [(TOKEN_KEY, self.token()), (USER_ID_KEY, self.user_id.as_deref())] {
            if let Err(e) = store.set(key, value.unwrap_or_default()) {
                error!(key, "failed to persist identity: {e}");
            }
        }
        debug!(user_id = self.user_id(), "signed in");
    }

    pub fn clear_session(&mut self, store: &impl KvStore) {
        *self = Self::anonymous();
        for key in [TOKEN_KEY, USER_ID_KEY] {
            if let Err(e) = store.remove(key) {
                error!(key, "failed to remove identity: {e}");
            }
        }
        debug!("signed out");
    }
}
