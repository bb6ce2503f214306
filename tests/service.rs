//! End-to-end checks of the request pipelines with in-memory parser and
//! store doubles.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};

use dqltools::ast::foreign::GraphQuery;
use dqltools::ast::{encode_queries, FilterTree, Function, QueryBlock, QueryNode, QueryParser};
use dqltools::error::{Error, ParseError, StoreError};
use dqltools::service::{QueryRequest, QueryService};
use dqltools::store::{QueryExecutor, TimeoutExecutor};

/// Parses any text into the tree it was built with, defaults removed.
struct Mirror {
    queries: Vec<GraphQuery>,
}

impl Mirror {
    fn of(block: &QueryBlock) -> Self {
        let stripped: Vec<QueryNode> = block
            .queries
            .iter()
            .cloned()
            .map(QueryNode::strip_defaults)
            .collect();
        Self {
            queries: encode_queries(&stripped),
        }
    }
}

impl QueryParser for Mirror {
    fn name(&self) -> &str {
        "mirror"
    }

    async fn parse(
        &self,
        _text: &str,
        _variables: &BTreeMap<String, String>,
    ) -> Result<Vec<GraphQuery>, ParseError> {
        Ok(self.queries.clone())
    }
}

/// Answers proof queries and data queries separately and logs every call.
struct Store {
    proof: Value,
    data: Value,
    calls: Mutex<Vec<(String, BTreeMap<String, String>)>>,
}

impl Store {
    fn new(proof: Value, data: Value) -> Self {
        Self {
            proof,
            data,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl QueryExecutor for Store {
    async fn execute(
        &self,
        query: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), variables.clone()));
        let answer = if query.contains("proof(func:") {
            &self.proof
        } else {
            &self.data
        };
        Ok(serde_json::to_vec(answer).unwrap())
    }
}

struct Down;

impl QueryExecutor for Down {
    async fn execute(
        &self,
        _query: &str,
        _variables: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

fn company_block() -> QueryBlock {
    let mut block = QueryBlock::new(vec![QueryNode {
        alias: "company".into(),
        ids: vec![7],
        func: Some(Function::named("uid")),
        children: vec![
            QueryNode {
                attr: "name".into(),
                ..Default::default()
            },
            QueryNode {
                attr: "employees".into(),
                default: Some(json!(0)),
                ..Default::default()
            },
        ],
        ..Default::default()
    }]);
    block.alias = "company".into();
    block
}

fn proof_from(identity: u64, target: u64) -> QueryNode {
    QueryNode {
        alias: "proof".into(),
        ids: vec![identity],
        func: Some(Function::named("uid")),
        children: vec![QueryNode {
            alias: "proof".into(),
            attr: "works_at".into(),
            filter: Some(FilterTree::leaf(Function {
                name: "uid".into(),
                ids: vec![target],
                ..Default::default()
            })),
            children: vec![QueryNode {
                alias: "proof".into(),
                attr: "uid".into(),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn request(identity: u64, proofs: BTreeMap<u64, QueryNode>) -> QueryRequest {
    QueryRequest {
        block: company_block(),
        values: BTreeMap::from([("$lang".to_string(), "en".to_string())]),
        identity,
        proofs,
    }
}

#[tokio::test]
async fn test_authorized_query_returns_defaulted_response() {
    let store = Store::new(
        json!({ "proof": [{ "proof": [{ "proof": "0x07" }] }] }),
        json!({ "company": [{ "name": "Acme" }] }),
    );
    let service = QueryService::new(Mirror::of(&company_block()), &store);

    let response = service
        .query(&request(1, BTreeMap::from([(7, proof_from(1, 7))])))
        .await
        .unwrap();
    assert_eq!(
        response,
        json!({ "company": [{ "name": "Acme", "employees": 0 }] })
    );

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].0.starts_with("{\n    proof(func: uid(0x01)) {"));
    assert!(calls[0].1.is_empty());
    assert!(calls[1].0.starts_with("query company {"));
    assert_eq!(calls[1].1.get("$lang").map(String::as_str), Some("en"));
}

#[tokio::test]
async fn test_denied_query_never_reaches_store() {
    let store = Store::new(
        json!({ "proof": [{ "proof": [{ "proof": "0x07" }] }] }),
        json!({ "company": [] }),
    );
    let service = QueryService::new(Mirror::of(&company_block()), &store);

    let err = service.query(&request(1, BTreeMap::new())).await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized { identity: 1 }));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_wrong_proof_target_denied() {
    let store = Store::new(
        json!({ "proof": [{ "proof": [{ "proof": "0x08" }] }] }),
        json!({ "company": [] }),
    );
    let service = QueryService::new(Mirror::of(&company_block()), &store);

    let err = service
        .query(&request(1, BTreeMap::from([(7, proof_from(1, 7))])))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized { .. }));
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn test_store_timeout_is_not_a_denial() {
    let executor = TimeoutExecutor::new(Down, Duration::from_millis(20));
    let service = QueryService::new(Mirror::of(&company_block()), executor);

    let err = service
        .query(&request(1, BTreeMap::from([(7, proof_from(1, 7))])))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Proof(_)));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_template_rejects_inconsistent_parser() {
    let mut other = company_block();
    other.queries[0].children.pop();
    let store = Store::new(json!({}), json!({}));
    let service = QueryService::new(Mirror::of(&other), &store);

    match service.template(&company_block()).await {
        Err(Error::Consistency(err)) => {
            assert!(err.difference.contains("queries[0].children"));
            assert!(err.rendered.contains("employees"));
        }
        other => panic!("expected consistency error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_parse_decodes_parser_output() {
    let store = Store::new(json!({}), json!({}));
    let service = QueryService::new(Mirror::of(&company_block()), &store);
    let parsed = service
        .parse("{ company(func: uid(0x07)) { name employees } }", &BTreeMap::new())
        .await
        .unwrap();
    assert_eq!(
        parsed,
        vec![company_block().queries[0].clone().strip_defaults()]
    );
}
