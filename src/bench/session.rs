use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::{AppResult, RpcError};
use crate::rpc::{AUTH_LOGIN, AUTH_LOGOUT, Value};

use super::invoker::TimedInvoker;
use super::record::Repeats;

/// Login name and password for one identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque session key handed out by `auth.login`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn as_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Current identity against one server.
///
/// The token is `None` before the first login and after a logout; only the
/// login call itself may be issued without one.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    hostname: String,
    token: Option<SessionToken>,
}

impl Session {
    #[must_use]
    pub fn new(credentials: Credentials, hostname: impl Into<String>) -> Self {
        Self {
            credentials,
            hostname: hostname.into(),
            token: None,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Logs in with the current credentials, measuring `auth.login`.
    ///
    /// An existing session is closed first.
    ///
    /// # Errors
    ///
    /// Returns the RPC error of the logout or login call, or
    /// [`RpcError::Malformed`] when the server answers without a key.
    pub async fn login(&mut self, invoker: &mut TimedInvoker, repeats: Repeats) -> AppResult<()> {
        if self.token.is_some() {
            self.logout(invoker).await?;
        }
        info!("Logging in to {} as {}", self.hostname, self.credentials.username);
        let args = vec![
            json!(self.credentials.username),
            json!(self.credentials.password),
        ];
        let (key, _) = invoker
            .measure(self, i64::from(repeats), AUTH_LOGIN, args)
            .await?;
        match key {
            Value::String(key) => {
                self.token = Some(SessionToken(key));
                Ok(())
            }
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::Array(_)
            | Value::Object(_) => Err(
                RpcError::malformed(format!("{} did not return a session key", AUTH_LOGIN)).into(),
            ),
        }
    }

    /// Invalidates the session key. Unmeasured; a no-op without a key.
    ///
    /// # Errors
    ///
    /// Returns the RPC error of the logout call. The key is kept in that case.
    pub async fn logout(&mut self, invoker: &TimedInvoker) -> AppResult<()> {
        if self.token.is_none() {
            return Ok(());
        }
        info!("Logging out {}", self.credentials.username);
        invoker.call(self, AUTH_LOGOUT, Vec::new()).await?;
        self.token = None;
        Ok(())
    }

    /// Replaces the identity: logout, then a measured login as `credentials`.
    ///
    /// # Errors
    ///
    /// Returns the RPC error of either call.
    pub async fn switch_identity(
        &mut self,
        invoker: &mut TimedInvoker,
        credentials: Credentials,
        repeats: Repeats,
    ) -> AppResult<()> {
        self.logout(invoker).await?;
        self.credentials = credentials;
        self.login(invoker, repeats).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::AppError;
    use crate::rpc::mock::MockTransport;

    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn switch_identity_logs_out_then_in() -> AppResult<()> {
        let transport = Arc::new(MockTransport::new());
        let mut invoker = TimedInvoker::new(transport.clone());
        let mut session = Session::new(Credentials::new("admin", "secret"), "sat.example.com");

        session.login(&mut invoker, Repeats::ONE).await?;
        session
            .switch_identity(
                &mut invoker,
                Credentials::new("benchmark-org-0-admin", "benchmark-org-0-pass"),
                Repeats::ONE,
            )
            .await?;

        let methods: Vec<String> = transport
            .calls()
            .into_iter()
            .map(|call| call.method)
            .collect();
        if methods != [AUTH_LOGIN, AUTH_LOGOUT, AUTH_LOGIN] {
            return Err(AppError::config(format!("unexpected calls: {:?}", methods)));
        }
        if session.username() != "benchmark-org-0-admin" {
            return Err(AppError::config("username was not switched"));
        }
        let Some(token) = session.token() else {
            return Err(AppError::config("expected a session key"));
        };
        if token.as_value() != json!("key-benchmark-org-0-admin") {
            return Err(AppError::config("session key was not replaced"));
        }
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn logout_without_key_is_noop() -> AppResult<()> {
        let transport = Arc::new(MockTransport::new());
        let invoker = TimedInvoker::new(transport.clone());
        let mut session = Session::new(Credentials::new("admin", "secret"), "sat.example.com");
        session.logout(&invoker).await?;
        if !transport.calls().is_empty() {
            return Err(AppError::config("logout without a key reached the server"));
        }
        Ok(())
    }

    #[tokio::test(flavor = "current_thread")]
    async fn login_rejects_non_string_key() -> AppResult<()> {
        let transport = Arc::new(MockTransport::new().respond(AUTH_LOGIN, json!(42)));
        let mut invoker = TimedInvoker::new(transport);
        let mut session = Session::new(Credentials::new("admin", "secret"), "sat.example.com");
        match session.login(&mut invoker, Repeats::ONE).await {
            Err(AppError::Rpc(RpcError::Malformed { .. })) => {}
            other => return Err(AppError::config(format!("unexpected result: {:?}", other))),
        }
        if session.is_authenticated() {
            return Err(AppError::config("session should stay anonymous"));
        }
        Ok(())
    }

    #[test]
    fn debug_output_hides_password() -> Result<(), String> {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        if rendered.contains("hunter2") {
            return Err(format!("password leaked: {}", rendered));
        }
        Ok(())
    }
}
