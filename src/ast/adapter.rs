/// Parser capability for the external query grammar.
///
/// The grammar is owned by the graph store, not by us. Anything able to
/// turn query text into the store's native tree can stand behind this
/// trait: an in-process binding, a sidecar, or a test double.
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;

use serde::Serialize;

use super::foreign::GraphQuery;
use crate::error::ParseError;
use crate::process;

/// The authoritative parser for the query language.
///
/// # Example
///
/// ```ignore
/// struct Fixed(Vec<GraphQuery>);
///
/// impl QueryParser for Fixed {
///     fn name(&self) -> &str { "fixed" }
///     async fn parse(&self, _: &str, _: &BTreeMap<String, String>) -> Result<Vec<GraphQuery>, ParseError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
pub trait QueryParser: Send + Sync {
    /// Human-readable name of the parser, used in logs.
    fn name(&self) -> &str;

    /// Parse query text. `variables` maps each `$name` to a value; only the
    /// names matter when the result is compared structurally.
    fn parse(
        &self,
        text: &str,
        variables: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<Vec<GraphQuery>, ParseError>> + Send;
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    query: &'a str,
    variables: &'a BTreeMap<String, String>,
}

/// Runs an external program per parse: the request goes to its stdin as
/// JSON, the parsed queries come back on stdout.
#[derive(Debug, Clone)]
pub struct ProcessParser {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessParser {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl QueryParser for ProcessParser {
    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("external parser")
    }

    async fn parse(
        &self,
        text: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<Vec<GraphQuery>, ParseError> {
        let request = serde_json::to_vec(&ParseRequest {
            query: text,
            variables,
        })
        .map_err(|e| ParseError::new(format!("encode parse request: {}", e)))?;

        // A non-zero exit carries the parser's own message.
        let stdout = process::exchange(&self.program, &self.args, &request)
            .await
            .map_err(|e| ParseError::new(e.to_string()))?;

        serde_json::from_slice(&stdout)
            .map_err(|e| ParseError::new(format!("decode parser output: {}", e)))
    }
}
