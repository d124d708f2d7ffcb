//! # SmartScript and the server that hosts it
//!
//! A page is plain text with tags in it. Everything outside a tag is copied to
//! the response as is, tags are evaluated:
//!
//! ``` text
//! {$ FOR i 1 10 2 $}
//!   This is {$= i $}-th time this message is generated.
//! {$END$}
//! {$FOR j "-2" -1.35e1 $}
//!   sin({$=j$}^2) = {$= j j * @sin "0.000" @decfmt $}
//! {$END$}
//! ```

//! ## Lexing
//!
//! The lexer works in two modes. Outside of tags it collects text, where only
//! `\\` and `\{` are escapes. Inside a tag it skips whitespace and produces
//! variables, `@functions`, operators, numbers and strings. The first token of
//! a tag is its name: `=`, `FOR` or `END`.

//! ## Parsing
//!
//! A single pass builds the node tree. `FOR` opens a loop that collects nodes
//! until its `END`, so the parser keeps a stack of open loops.
//!
//! ``` markdown
//! Document
//! ├── ForLoop i 1 10 2
//! │   ├── Text "This is "
//! │   ├── Echo i
//! │   └── Text "-th time ..."
//! └── Text "\n"
//! ```

//! ## Execution
//!
//! A tree walk over the document. Each loop pushes its variable on a named
//! stack, so an inner loop can shadow an outer one with the same name. An echo
//! tag is a little stack machine: constants and variables are pushed,
//! operators and functions pop their arguments and push the result, and what
//! is left on the stack gets written bottom to top.

//! ## Serving
//!
//! Each request gets a [`RequestContext`] that holds the response metadata
//! until the first body byte is written. Sessions are tracked with a `sid`
//! cookie, and their parameters outlive a single request.

pub mod cli;
pub mod context;
mod engine;
mod environment;
pub mod error;
mod interpreter;
mod lexer;
mod parser;
pub mod server;

pub use context::{Cookie, Dispatcher, PersistentParameters, RequestContext};
pub use engine::ScriptEngine;
pub use error::{
	ScriptError,
	context::ContextError,
	interpreter::{InterpreterError, ValueError},
	lexer::{LexerError, LexerErrorType},
	parser::{ParseError, ParseErrorType, ParserError},
	server::ServerError,
};
pub use interpreter::{Interpreter, value::ValueWrapper};
pub use lexer::{Lexer, Operator, Token, TokenType};
pub use parser::{Element, Node, parse};
pub use server::{ServerConfig, ServerHandle, SmartServer};
