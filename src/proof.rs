//! Capability proof verifier.
//!
//! A requester may only query identifiers it can reach from its own
//! identity. For each foreign identifier it supplies a proof query rooted at
//! itself; the verifier runs that query and walks the store's answer to see
//! whether it really arrives at the identifier in question. The requester
//! picks the shape of the proof but never its result.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::ast::compiler::render;
use crate::ast::types::{format_uid, parse_uid, Function, QueryBlock, QueryNode};
use crate::error::ProofError;
use crate::store::QueryExecutor;

/// The only function allowed at the root of an authorized query or proof.
pub const UID_FUNCTION: &str = "uid";

/// Key the proof walk descends through in mappings.
pub const PROOF_KEY: &str = "proof";

pub struct ProofVerifier<E> {
    executor: E,
}

impl<E: QueryExecutor> ProofVerifier<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Whether `identity` may run `queries`. A denial is `Ok(false)`; `Err`
    /// means the answer could not be determined.
    ///
    /// Every root must be a bare `uid(...)` lookup over its own `ids`, and
    /// every identifier other than `identity` needs a proof in `proofs` that
    /// the store confirms. The first failure decides.
    pub async fn query_allowed(
        &self,
        queries: &[QueryNode],
        identity: u64,
        proofs: &BTreeMap<u64, QueryNode>,
    ) -> Result<bool, ProofError> {
        // Structural checks first, so a request that can never pass costs
        // no store round trips.
        let mut pending = Vec::new();
        for query in queries {
            if !is_plain_lookup(query) {
                tracing::debug!(
                    query = query.name(),
                    function = query.func.as_ref().map(|f| f.name.as_str()).unwrap_or(""),
                    "denied: root is not a bare identifier lookup"
                );
                return Ok(false);
            }
            for &uid in query.ids.iter().filter(|&&uid| uid != identity) {
                let Some(proof) = proofs.get(&uid) else {
                    tracing::debug!(uid = %format_uid(uid), "denied: no proof supplied");
                    return Ok(false);
                };
                if !is_rooted_at(proof, identity) {
                    tracing::debug!(
                        uid = %format_uid(uid),
                        identity = %format_uid(identity),
                        "denied: proof is not rooted at the requester"
                    );
                    return Ok(false);
                }
                pending.push((uid, proof));
            }
        }

        for (uid, proof) in pending {
            if !self.has_path(uid, proof).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Run `proof` and check that its answer resolves to `uid`.
    async fn has_path(&self, uid: u64, proof: &QueryNode) -> Result<bool, ProofError> {
        let text = render(&QueryBlock::new(vec![proof.clone()]))
            .map_err(|source| ProofError::Render { uid, source })?;

        let body = self
            .executor
            .execute(&text, &BTreeMap::new())
            .await
            .map_err(|source| {
                tracing::warn!(uid = %format_uid(uid), error = %source, "proof query failed");
                ProofError::Store { uid, source }
            })?;

        let response: Value = serde_json::from_slice(&body)
            .map_err(|source| ProofError::Response { uid, source })?;

        let resolved =
            follow_proof(&response).map_err(|reason| ProofError::Malformed { uid, reason })?;

        let found = parse_uid(resolved).map_err(|source| ProofError::InvalidIdentifier {
            uid,
            value: resolved.to_string(),
            source,
        })?;

        if found != uid {
            tracing::debug!(
                uid = %format_uid(uid),
                resolved = %format_uid(found),
                "denied: proof resolves to a different identifier"
            );
        }
        Ok(found == uid)
    }
}

/// `uid(<ids>)` with the identifiers on the node and nothing else. Function
/// arguments, identifiers, variables or an attribute would all render into
/// the lookup and name nodes the verifier never sees.
fn is_plain_lookup(query: &QueryNode) -> bool {
    match &query.func {
        Some(func) => *func == Function::named(UID_FUNCTION) && query.attr.is_empty(),
        None => false,
    }
}

/// A proof must start from exactly the requester's identity.
fn is_rooted_at(proof: &QueryNode, identity: u64) -> bool {
    is_plain_lookup(proof) && proof.ids.as_slice() == [identity]
}

/// Walk a proof response down to the identifier it names: strings end the
/// walk, mappings continue through [`PROOF_KEY`], lists through their first
/// element.
pub fn follow_proof(response: &Value) -> Result<&str, String> {
    let mut current = response;
    loop {
        current = match current {
            Value::String(uid) => return Ok(uid.as_str()),
            Value::Object(map) => map
                .get(PROOF_KEY)
                .ok_or_else(|| format!("no `{}` key", PROOF_KEY))?,
            Value::Array(items) => items.first().ok_or_else(|| "empty list".to_string())?,
            Value::Null => return Err("null".to_string()),
            Value::Bool(_) => return Err("unexpected boolean".to_string()),
            Value::Number(_) => return Err("unexpected number".to_string()),
        };
    }
}
