//! Error taxonomy.
//!
//! Authorization denial is not an error: the verifier answers `Ok(false)`
//! and only the service layer turns that into [`Error::Unauthorized`].

use std::num::ParseIntError;
use std::time::Duration;

use crate::ast::types::format_uid;

fn hex(uid: &u64) -> String {
    format_uid(*uid)
}

/// The tree cannot be turned into query text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("query node has neither alias nor attribute to name it")]
    UnnamedBlock,

    #[error("function `{function}` on `{node}` has no attribute, identifiers or variables to render")]
    EmptyFunction { node: String, function: String },

    #[error("filter on `{node}` sets both operator `{op}` and a function")]
    AmbiguousFilter { node: String, op: String },

    #[error("filter operator `{op}` on `{node}` has no operands")]
    EmptyConnective { node: String, op: String },

    #[error("math operator `{op}` on `{node}` has no operands")]
    EmptyMathOperator { node: String, op: String },

    #[error("math operand on `{node}` carries neither a constant nor a variable")]
    EmptyMathOperand { node: String },

    #[error("checkpwd on `{node}` takes exactly one argument, found {found}")]
    CheckPwdArity { node: String, found: usize },

    #[error("variable `{name}` used by `{node}` is not defined anywhere in the block")]
    UndefinedVariable { node: String, name: String },
}

/// The external parser rejected the text. The message is its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Re-parsing the rendered text produced a different tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rendered query does not parse back to the same tree: {difference}")]
pub struct ConsistencyError {
    pub rendered: String,
    pub difference: String,
}

/// Failure reported by the store/execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    #[error("store request timed out after {0:?}")]
    Timeout(Duration),
}

/// An external program used as parser or store did not answer.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("write request to {program}: {source}")]
    Write {
        program: String,
        source: std::io::Error,
    },

    #[error("wait for {program}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },

    /// Non-zero exit. The program's stderr is the message.
    #[error("{stderr}")]
    Exit { program: String, stderr: String },
}

/// Verifying a proof could not reach a yes/no answer.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("proof for {} could not be rendered: {source}", hex(.uid))]
    Render { uid: u64, source: RenderError },

    #[error("proof for {} failed in the store: {source}", hex(.uid))]
    Store { uid: u64, source: StoreError },

    #[error("proof response for {} is not JSON: {source}", hex(.uid))]
    Response {
        uid: u64,
        source: serde_json::Error,
    },

    #[error("proof response for {} is malformed: {reason}", hex(.uid))]
    Malformed { uid: u64, reason: String },

    #[error("proof for {} resolved to `{value}`, which is not an identifier", hex(.uid))]
    InvalidIdentifier {
        uid: u64,
        value: String,
        source: ParseIntError,
    },
}

/// Errors surfaced by the request pipelines in [`crate::service`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store response is not JSON: {0}")]
    Response(#[from] serde_json::Error),

    #[error("requester {} is not allowed to resolve this query", hex(.identity))]
    Unauthorized { identity: u64 },
}
