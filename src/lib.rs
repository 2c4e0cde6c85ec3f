//! A homoiconic node machine. One tree type serves as syntax node, runtime
//! value, namespace and stack; source text is tokenized into leaf nodes that are
//! evaluated one at a time against a shared machine.

pub mod diagnostics;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod stdlib;

pub use diagnostics::{Diagnostic, DiagnosticKind, Result, VmError};
pub use node::{Flow, Insertable, NativeOperation, Node, NodeKind, Scalar};
pub use repl::Repl;
pub use runtime::{DriverOptions, Interpreter};
