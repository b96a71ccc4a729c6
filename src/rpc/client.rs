use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::RpcError;

use super::{RpcTransport, Value, xmlrpc};

/// XML-RPC over HTTP(S) using one pooled `reqwest` client.
///
/// No request timeout is configured: a stalled call is part of the latency
/// being measured.
#[derive(Debug, Clone)]
pub struct XmlRpcClient {
    client: Client,
    endpoint: Url,
}

impl XmlRpcClient {
    /// Builds a client posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Transport`] when the HTTP client cannot be built
    /// (for example when the TLS backend fails to initialize).
    pub fn new(endpoint: Url, insecure: bool) -> Result<Self, RpcError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .danger_accept_invalid_hostnames(insecure)
            .build()
            .map_err(|err| RpcError::Transport {
                endpoint: endpoint.to_string(),
                message: format!("failed to build HTTP client: {}", err),
            })?;
        Ok(Self { client, endpoint })
    }

    fn transport_error(&self, err: &reqwest::Error) -> RpcError {
        RpcError::Transport {
            endpoint: self.endpoint.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl RpcTransport for XmlRpcClient {
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        let body = xmlrpc::encode_call(method, params);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|err| self.transport_error(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport {
                endpoint: self.endpoint.to_string(),
                message: format!("HTTP status {} for {}", status, method),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|err| self.transport_error(&err))?;
        xmlrpc::decode_response(&text)
    }
}
