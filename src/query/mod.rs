pub mod compiler;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod recency;

pub use compiler::{CompileMode, QueryCompiler};
pub use lexer::{LexError, Lexer, Token, TokenKind};
pub use node::{Boolean, QueryNode, RecencyQuery};
pub use parser::{ParseError, parse_query};
pub use recency::{RecencyConfig, RecencyScorer};
