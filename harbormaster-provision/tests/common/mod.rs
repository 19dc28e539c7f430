//! Shared fakes for orchestrator tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use harbormaster_core::{CredentialEnvVariable, EnvVarName, StoreError};
use harbormaster_provision::{
    ClientError, CredentialStore, MemoryCredentialStore, RegistryClient, RegistryResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum Reply {
    Ok(u16, Value),
    Status(u16),
}

/// Registry fake answering from a fixed script. Replies are reusable, so the
/// same script serves repeated operations. Unscripted requests get a 500.
#[derive(Debug, Default)]
pub struct ScriptedRegistry {
    replies: HashMap<(Method, String), Reply>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, method: Method, path: impl Into<String>, status: u16, body: Value) -> Self {
        self.replies.insert((method, path.into()), Reply::Ok(status, body));
        self
    }

    pub fn fail(mut self, method: Method, path: impl Into<String>, status: u16) -> Self {
        self.replies.insert((method, path.into()), Reply::Status(status));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, method: Method, path: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| c.method == method && c.path == path)
    }

    pub fn body_of(&self, method: Method, path: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .find(|c| c.method == method && c.path == path)
            .and_then(|c| c.body)
    }

    /// Yields once before answering so concurrent operations can interleave
    /// the way they would over a real connection.
    async fn answer(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RegistryResponse, ClientError> {
        tokio::task::yield_now().await;
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        match self.replies.get(&(method, path.to_string())) {
            Some(Reply::Ok(status, body)) => Ok(RegistryResponse::new(*status, body.clone())),
            Some(Reply::Status(status)) => Err(ClientError::Status {
                status: *status,
                message: format!("scripted {status}"),
            }),
            None => Err(ClientError::Status {
                status: 500,
                message: format!("unscripted {method:?} {path}"),
            }),
        }
    }
}

#[async_trait]
impl RegistryClient for ScriptedRegistry {
    async fn get(&self, path: &str) -> Result<RegistryResponse, ClientError> {
        self.answer(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<RegistryResponse, ClientError> {
        self.answer(Method::Post, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<RegistryResponse, ClientError> {
        self.answer(Method::Delete, path, None).await
    }
}

/// Registry that accepts every provisioning request for `name` with id `id`.
pub fn provisioning_registry(name: &str, id: i64) -> ScriptedRegistry {
    ScriptedRegistry::new()
        .ok(Method::Post, "projects", 201, Value::Null)
        .ok(
            Method::Get,
            format!("projects?name={name}"),
            200,
            json!([{ "project_id": id, "name": name, "repo_count": 0 }]),
        )
        .ok(
            Method::Post,
            format!("projects/{id}/robots"),
            201,
            json!({ "name": format!("robot${name}"), "token": "issued-token" }),
        )
        .ok(
            Method::Post,
            format!("projects/{id}/webhook/policies"),
            201,
            Value::Null,
        )
}

/// Memory store that refuses to write one record name.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub fail_on: Option<EnvVarName>,
    pub inner: MemoryCredentialStore,
    pub attempts: Mutex<Vec<EnvVarName>>,
}

impl FailingStore {
    pub fn failing_on(name: EnvVarName) -> Self {
        Self {
            fail_on: Some(name),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<EnvVarName> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for FailingStore {
    async fn insert_env_variable(&self, variable: &CredentialEnvVariable) -> Result<(), StoreError> {
        self.attempts.lock().unwrap().push(variable.name);
        if self.fail_on == Some(variable.name) {
            return Err(StoreError::Unavailable("database connection lost".into()));
        }
        self.inner.insert_env_variable(variable).await
    }
}
