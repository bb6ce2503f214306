//! Request pipelines.
//!
//! Ties the renderer, the round-trip validator, the proof verifier and the
//! store together:
//!
//! ```text
//! template: block → render → round-trip check → text
//! parse:    text → external parser → tree
//! query:    block → template → authorize → execute → defaults → JSON
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ast::adapter::QueryParser;
use crate::ast::parser::parse_block;
use crate::ast::types::{format_uid, QueryBlock, QueryNode};
use crate::ast::validator::validate_round_trip;
use crate::defaults::apply_defaults;
use crate::error::Error;
use crate::proof::ProofVerifier;
use crate::store::QueryExecutor;

/// An authorized query as a requester submits it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    pub block: QueryBlock,
    /// Values for the block's `$name` variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
    /// The requester's own identifier.
    pub identity: u64,
    /// Proof queries keyed by the identifier each one vouches for.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub proofs: BTreeMap<u64, QueryNode>,
}

pub struct QueryService<P, E> {
    parser: P,
    verifier: ProofVerifier<E>,
}

impl<P: QueryParser, E: QueryExecutor> QueryService<P, E> {
    pub fn new(parser: P, executor: E) -> Self {
        Self {
            parser,
            verifier: ProofVerifier::new(executor),
        }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn verifier(&self) -> &ProofVerifier<E> {
        &self.verifier
    }

    /// Render `block` and confirm the text parses back to it.
    pub async fn template(&self, block: &QueryBlock) -> Result<String, Error> {
        validate_round_trip(&self.parser, block).await
    }

    pub async fn parse(
        &self,
        text: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<Vec<QueryNode>, Error> {
        Ok(parse_block(&self.parser, text, variables).await?)
    }

    /// Run `request` on behalf of its requester. Nothing reaches the store
    /// before every identifier in the block is proven reachable.
    pub async fn query(&self, request: &QueryRequest) -> Result<Value, Error> {
        let text = self.template(&request.block).await?;

        let allowed = self
            .verifier
            .query_allowed(&request.block.queries, request.identity, &request.proofs)
            .await?;
        if !allowed {
            tracing::debug!(identity = %format_uid(request.identity), "query denied");
            return Err(Error::Unauthorized {
                identity: request.identity,
            });
        }

        let body = self
            .verifier
            .executor()
            .execute(&text, &request.values)
            .await?;
        let response: Value = serde_json::from_slice(&body)?;
        Ok(apply_defaults(&request.block.queries, response))
    }
}
