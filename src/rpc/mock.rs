use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::error::RpcError;

use super::{AUTH_LOGIN, AUTH_LOGOUT, RpcTransport, Value};

type Handler = Box<dyn Fn(&[Value]) -> Result<Value, RpcError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub(crate) method: String,
    pub(crate) params: Vec<Value>,
}

/// Scripted transport answering by method name.
pub(crate) struct MockTransport {
    handlers: BTreeMap<String, Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
        .respond_with(AUTH_LOGIN, |params| {
            let user = params.first().and_then(Value::as_str).unwrap_or("anonymous");
            Ok(json!(format!("key-{}", user)))
        })
        .respond(AUTH_LOGOUT, json!(1))
    }

    pub(crate) fn respond(self, method: &str, value: Value) -> Self {
        self.respond_with(method, move |_| Ok(value.clone()))
    }

    pub(crate) fn respond_with<F>(mut self, method: &str, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.handlers.insert(method.to_owned(), Box::new(handler));
        self
    }

    pub(crate) fn fail(self, method: &str, error: RpcError) -> Self {
        self.respond_with(method, move |_| Err(error.clone()))
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub(crate) fn calls_to(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    /// A freshly installed server: one organization, one user, nothing else.
    pub(crate) fn baseline() -> Self {
        let next_org = AtomicI64::new(2);
        Self::new()
            .respond("org.listOrgs", json!([{"id": 1, "name": "Default Organization"}]))
            .respond(
                "org.listSystemEntitlements",
                json!([
                    {"label": "provisioning_entitled", "used": 0, "allocated": 0, "free": 10, "unallocated": 10},
                    {"label": "enterprise_entitled", "used": 0, "allocated": 0, "free": 150, "unallocated": 150},
                ]),
            )
            .respond("channel.listAllChannels", json!([]))
            .respond("user.listUsers", json!([{"id": 1, "login": "admin"}]))
            .respond("system.listSystems", json!([]))
            .respond_with("org.create", move |params| {
                let id = next_org.fetch_add(1, Ordering::SeqCst);
                let name = params.get(1).cloned().unwrap_or(Value::Null);
                Ok(json!({"id": id, "name": name}))
            })
            .respond("org.setSystemEntitlements", json!(1))
            .respond("org.setSoftwareEntitlements", json!(1))
            .respond("user.create", json!(1))
            .respond("channel.software.create", json!(1))
            .respond("channel.software.listAllPackages", json!([]))
            .respond("errata.create", json!({"id": 1}))
            .respond_with("activationkey.create", |params| {
                let description = params.get(2).and_then(Value::as_str).unwrap_or_default();
                Ok(json!(format!("1-{}", description.len())))
            })
    }

    /// A server after setup: benchmark fixtures present in the first
    /// benchmark organization.
    pub(crate) fn populated() -> Self {
        Self::new()
            .respond(
                "org.listOrgs",
                json!([
                    {"id": 1, "name": "Default Organization"},
                    {"id": 2, "name": "benchmark-org-0"},
                    {"id": 3, "name": "benchmark-org-1"},
                ]),
            )
            .respond("org.listSoftwareEntitlements", json!([{"label": "rhel-server"}]))
            .respond(
                "org.listSystemEntitlements",
                json!([{"label": "enterprise_entitled", "used": 1, "allocated": 1001, "free": 10}]),
            )
            .respond_with("org.getDetails", |params| {
                Ok(json!({"name": params.get(1).cloned().unwrap_or(Value::Null)}))
            })
            .respond("org.listUsers", json!([{"login": "benchmark-org-0-admin"}]))
            .respond(
                "user.listUsers",
                json!([{"login": "benchmark-org-0-admin"}, {"login": "benchmark-org-0-user-0"}]),
            )
            .respond("user.getDetails", json!({"first_name": "Us0"}))
            .respond(
                "channel.listSoftwareChannels",
                json!([{"label": "benchmark-org-0-channel-0"}]),
            )
            .respond("channel.software.getDetails", json!({"arch_name": "x86_64"}))
            .respond(
                "channel.software.listAllPackages",
                json!([{"id": 501, "name": "benchmark-org-0-package-0"}, {"id": 502, "name": "benchmark-org-0-package-1"}]),
            )
            .respond("packages.getDetails", json!({"version": "0.2"}))
            .respond(
                "channel.software.listErrata",
                json!([{"advisory_name": "benchmark-org-0-channel-0-package-0"}]),
            )
            .respond("errata.getDetails", json!({"synopsis": "Fake advisory"}))
            .respond("system.listSystems", json!([{"id": 1_000_010_000_i64, "name": "System 0"}]))
            .respond("system.getDetails", json!({"profile_name": "System 0"}))
            .respond("system.getUnscheduledErrata", json!([]))
            .respond_with("org.delete", |params| match params.get(1).and_then(Value::as_i64) {
                Some(2 | 3) => Ok(json!(1)),
                other => Err(RpcError::Fault {
                    code: 2850,
                    message: format!("No such organization: {:?}", other),
                }),
            })
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method: method.to_owned(),
                params: params.to_vec(),
            });
        }
        match self.handlers.get(method) {
            Some(handler) => handler(params),
            None => Err(RpcError::Fault {
                code: -1,
                message: format!("Could not find method {}", method),
            }),
        }
    }
}
