use std::sync::Arc;
use std::time::{Instant, SystemTime};

use tracing::debug;

use crate::error::{AppResult, ConfigError};
use crate::rpc::{AUTH_LOGIN, RpcTransport, Value, output_size};

use super::record::{ActionRecord, Repeats, RunResult};
use super::session::Session;

const REDACTED: &str = "********";

/// Issues remote calls on behalf of a session and times the measured ones.
///
/// Measured calls append one [`ActionRecord`] each to a run-scoped log;
/// failed calls append nothing.
pub struct TimedInvoker {
    transport: Arc<dyn RpcTransport>,
    log: Vec<ActionRecord>,
}

impl TimedInvoker {
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            log: Vec::new(),
        }
    }

    /// Calls `method` `repeats` times back to back and records the elapsed
    /// time. Returns the last result together with its record.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRepeats`] for a repeat count below one,
    /// [`ConfigError::NotAuthenticated`] for a non-login call without a
    /// session key, and the first RPC error raised by any repetition.
    pub async fn measure(
        &mut self,
        session: &Session,
        repeats: i64,
        method: &str,
        args: Vec<Value>,
    ) -> AppResult<(Value, ActionRecord)> {
        let repeats = Repeats::try_from(repeats)?;
        let params = call_params(session, method, &args)?;
        let logged_args = redact(method, args);
        debug!(
            "Running measured API call {} {:?} with {} repeats",
            method, logged_args, repeats
        );

        let start = SystemTime::now();
        let clock = Instant::now();
        let mut output = Value::Null;
        for _ in 0..repeats.get() {
            output = self.transport.call(method, &params).await?;
        }
        let elapsed = clock.elapsed();

        let record = ActionRecord::new(
            method,
            logged_args,
            repeats,
            output_size(&output),
            start,
            elapsed,
        );
        self.log.push(record.clone());
        Ok((output, record))
    }

    /// Issues one call without recording it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotAuthenticated`] for a non-login call without
    /// a session key, or the RPC error of the call.
    pub async fn call(&self, session: &Session, method: &str, args: Vec<Value>) -> AppResult<Value> {
        let params = call_params(session, method, &args)?;
        debug!("Running unmeasured API call {} {:?}", method, redact(method, args));
        Ok(self.transport.call(method, &params).await?)
    }

    /// Drains the measurements recorded since the last drain.
    pub fn take_log(&mut self) -> RunResult {
        std::mem::take(&mut self.log)
    }

    #[must_use]
    pub fn log(&self) -> &[ActionRecord] {
        &self.log
    }
}

fn call_params(session: &Session, method: &str, args: &[Value]) -> Result<Vec<Value>, ConfigError> {
    match session.token() {
        Some(token) => {
            let mut params = Vec::with_capacity(args.len().saturating_add(1));
            params.push(token.as_value());
            params.extend_from_slice(args);
            Ok(params)
        }
        None if method == AUTH_LOGIN => Ok(args.to_vec()),
        None => Err(ConfigError::NotAuthenticated {
            method: method.to_owned(),
        }),
    }
}

fn redact(method: &str, mut args: Vec<Value>) -> Vec<Value> {
    if method == AUTH_LOGIN
        && let Some(password) = args.get_mut(1)
    {
        *password = Value::String(REDACTED.to_owned());
    }
    args
}
