/// Query tree model and the text pipeline around it.
///
/// ```text
/// Query text
///       ↓
/// External parser         (adapter.rs, foreign.rs)
///       ↓
/// Decoder / Encoder       (parser.rs, encoder.rs)
///       ↓
/// Query tree              (types.rs)
///       ↓
/// Symbol table            (symbols.rs)
///       ↓
/// Renderer                (compiler.rs + filter.rs, math.rs, facets.rs)
///       ↓
/// Normalized text         (formatter.rs)
///       ↓
/// Round-trip check        (validator.rs)
/// ```
pub mod adapter;
pub mod compiler;
pub mod encoder;
pub mod facets;
pub mod filter;
pub mod foreign;
pub mod formatter;
pub mod math;
pub mod parser;
pub mod symbols;
pub mod types;
pub mod validator;

// Re-export key types for convenience
pub use adapter::{ProcessParser, QueryParser};
pub use compiler::render;
pub use encoder::{encode_queries, encode_query};
pub use formatter::normalize_whitespace;
pub use parser::{decode_queries, decode_query, parse_block};
pub use symbols::SymbolTable;
pub use types::*;
pub use validator::validate_round_trip;
