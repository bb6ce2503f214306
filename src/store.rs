//! Store/execution collaborator.
//!
//! The graph store itself is out of scope; the crate only needs something
//! that runs rendered query text and hands back the JSON payload.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::StoreError;
use crate::process;

/// Executes rendered query text against the graph store.
pub trait QueryExecutor: Send + Sync {
    /// Run `query` with query-language variable values and return the raw
    /// JSON response body.
    fn execute(
        &self,
        query: &str,
        variables: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

impl<E: QueryExecutor> QueryExecutor for &E {
    fn execute(
        &self,
        query: &str,
        variables: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send {
        (**self).execute(query, variables)
    }
}

/// Bounds every call of the wrapped executor. Running out of time is a
/// [`StoreError::Timeout`], the same as any other store failure.
#[derive(Debug, Clone)]
pub struct TimeoutExecutor<E> {
    inner: E,
    limit: Duration,
}

impl<E> TimeoutExecutor<E> {
    pub fn new(inner: E, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: QueryExecutor> QueryExecutor for TimeoutExecutor<E> {
    async fn execute(
        &self,
        query: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, StoreError> {
        match tokio::time::timeout(self.limit, self.inner.execute(query, variables)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(limit = ?self.limit, "store call timed out");
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[derive(Serialize)]
struct StoreRequest<'a> {
    query: &'a str,
    variables: &'a BTreeMap<String, String>,
}

/// Runs each query through an external program: one
/// `{"query": ..., "variables": {...}}` object on stdin, the response body
/// on stdout.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl QueryExecutor for ProcessExecutor {
    async fn execute(
        &self,
        query: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, StoreError> {
        let request = serde_json::to_vec(&StoreRequest { query, variables })
            .map_err(|e| StoreError::Request(e.to_string()))?;
        process::exchange(&self.program, &self.args, &request)
            .await
            .map_err(|e| StoreError::Request(e.to_string()))
    }
}
