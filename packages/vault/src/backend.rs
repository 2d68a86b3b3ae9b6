//! Request dispatch
//!
//! [`EngineBackend`] maps request paths onto [`EngineManager`] operations.
//! The route table is built once in [`EngineBackend::new`] and never
//! changes afterwards.

use crate::engine::{EngineId, EngineManager};
use crate::error::{VaultError, VaultResult};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Request verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Fetch
    Read,
    /// Create or update
    Write,
    /// Remove
    Delete,
}

/// One call into the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Verb
    pub operation: Operation,
    /// Path relative to the mount, e.g. `config/payments`
    pub path: String,
    /// Authenticated identity of the caller
    pub caller: String,
    /// Request body
    #[serde(default)]
    pub data: Value,
}

impl Request {
    /// Read request
    pub fn read(path: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            operation: Operation::Read,
            path: path.into(),
            caller: caller.into(),
            data: Value::Null,
        }
    }

    /// Write request with a body
    pub fn write(path: impl Into<String>, caller: impl Into<String>, data: Value) -> Self {
        Self {
            operation: Operation::Write,
            path: path.into(),
            caller: caller.into(),
            data,
        }
    }

    /// Delete request
    pub fn delete(path: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            operation: Operation::Delete,
            path: path.into(),
            caller: caller.into(),
            data: Value::Null,
        }
    }
}

/// Response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// JSON payload returned to the caller
    pub data: Value,
}

impl Response {
    fn new(data: Value) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Config,
    Jwks,
    Token,
    Rotate,
    Health,
}

#[derive(Debug)]
struct Route {
    prefix: &'static str,
    handler: Handler,
    operations: &'static [Operation],
    help: &'static str,
}

/// Path router in front of an [`EngineManager`]
#[derive(Debug)]
pub struct EngineBackend {
    manager: EngineManager,
    routes: Vec<Route>,
}

impl EngineBackend {
    /// Build the backend and its route table
    pub fn new(manager: EngineManager) -> Self {
        let routes = vec![
            Route {
                prefix: "config",
                handler: Handler::Config,
                operations: &[Operation::Read, Operation::Write, Operation::Delete],
                help: "Configure an engine's allowed subjects, issuer, audience and TTL",
            },
            Route {
                prefix: "jwks",
                handler: Handler::Jwks,
                operations: &[Operation::Read],
                help: "Public key of an engine as a JWK set",
            },
            Route {
                prefix: "token",
                handler: Handler::Token,
                operations: &[Operation::Read, Operation::Write],
                help: "Issue an RS256 token signed by the engine",
            },
            Route {
                prefix: "rotate",
                handler: Handler::Rotate,
                operations: &[Operation::Write],
                help: "Replace an engine's key pair",
            },
            Route {
                prefix: "health",
                handler: Handler::Health,
                operations: &[Operation::Read, Operation::Write],
                help: "Inspect (read) or repair (write) an engine's stored records",
            },
        ];
        Self { manager, routes }
    }

    /// The wrapped manager
    pub fn manager(&self) -> &EngineManager {
        &self.manager
    }

    /// Route prefixes with their help text
    pub fn paths(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.routes.iter().map(|r| (r.prefix, r.help))
    }

    /// Dispatch a request
    pub async fn handle(&self, request: Request) -> VaultResult<Response> {
        let prefix = request.path.split('/').next().unwrap_or_default();
        let route = self
            .routes
            .iter()
            .find(|r| r.prefix == prefix)
            .ok_or_else(|| VaultError::InvalidPath(request.path.clone()))?;

        if !route.operations.contains(&request.operation) {
            return Err(VaultError::UnsupportedOperation(format!(
                "{:?} on {}/",
                request.operation, route.prefix
            )));
        }

        let id = EngineId::from_path(&request.path)?;
        match (route.handler, request.operation) {
            (Handler::Config, Operation::Read) => {
                let config = self.manager.read(&id, &request.caller).await?;
                Ok(Response::new(json!({ "config": config })))
            }
            (Handler::Config, Operation::Write) => {
                let existed = self.manager.exists(&id).await?;
                self.manager.write_value(&id, &request.data).await?;
                info!(
                    "{} engine {id}",
                    if existed { "Updated" } else { "Created" }
                );
                Ok(Response::new(json!({ "config": "Config Set" })))
            }
            (Handler::Config, Operation::Delete) => {
                let report = self.manager.delete(&id).await;
                Ok(Response::new(json!({
                    "config": "Config Deleted",
                    "deleted": report,
                })))
            }
            (Handler::Jwks, _) => {
                let jwks = self.manager.public_jwks(&id, &request.caller).await?;
                Ok(Response::new(serde_json::to_value(jwks)?))
            }
            (Handler::Token, _) => {
                let token = self.manager.issue_token(&id, &request.caller).await?;
                Ok(Response::new(json!({ "token": token })))
            }
            (Handler::Rotate, _) => {
                let jwk = self.manager.rotate_keys(&id).await?;
                Ok(Response::new(json!({ "kid": jwk.kid })))
            }
            (Handler::Health, Operation::Read) => {
                let health = self.manager.inspect(&id).await?;
                Ok(Response::new(json!({ "health": health })))
            }
            (Handler::Health, _) => {
                let health = self.manager.repair(&id).await?;
                Ok(Response::new(json!({ "health": health })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use jwks_key::{KeySize, RsaKeyGenerator};
    use std::sync::Arc;

    fn backend() -> EngineBackend {
        let manager = EngineManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RsaKeyGenerator::new()),
        )
        .with_key_size(KeySize::new(1024).unwrap());
        EngineBackend::new(manager)
    }

    #[tokio::test]
    async fn test_unknown_prefix() {
        let err = backend()
            .handle(Request::read("secrets/alpha", "root"))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_operation_not_on_route() {
        let err = backend()
            .handle(Request::delete("jwks/alpha", "root"))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::UnsupportedOperation(_)));
    }

    #[tokio::test]
    async fn test_bad_engine_name() {
        let err = backend()
            .handle(Request::read("config/-bad", "root"))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidPath(_)));
    }

    #[test]
    fn test_route_table() {
        let prefixes: Vec<_> = backend().paths().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["config", "jwks", "token", "rotate", "health"]);
    }

    #[test]
    fn test_request_deserializes_without_data() {
        let request: Request = serde_json::from_value(json!({
            "operation": "read",
            "path": "config/alpha",
            "caller": "bob"
        }))
        .unwrap();
        assert_eq!(request, Request::read("config/alpha", "bob"));
    }
}
