use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Result, VmError};

/// Native operation signature: receives the environment it runs against.
pub type Operation = fn(&Node) -> Result<Flow>;

/// What an evaluation step hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// The step produced nothing.
    Next,
    Value(Node),
    /// Terminate the run; no further nodes are evaluated.
    Halt,
}

#[derive(Clone)]
pub struct NativeOperation {
    pub name: String,
    pub callback: Operation,
}

impl NativeOperation {
    pub fn new(name: impl Into<String>, callback: Operation) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }

    pub fn call(&self, env: &Node) -> Result<Flow> {
        (self.callback)(env)
    }
}

impl fmt::Debug for NativeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}>", self.name)
    }
}

/// Anything that may be stored in a node's slots or children.
#[derive(Debug, Clone)]
pub enum Insertable {
    Node(Node),
    Native(NativeOperation),
}

impl From<Node> for Insertable {
    fn from(node: Node) -> Self {
        Insertable::Node(node)
    }
}

impl From<&Node> for Insertable {
    fn from(node: &Node) -> Self {
        Insertable::Node(node.clone())
    }
}

impl From<NativeOperation> for Insertable {
    fn from(op: NativeOperation) -> Self {
        Insertable::Native(op)
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Symbol,
    Integer,
    Float,
    Hex,
    Bin,
    Vector,
    Map,
    Command(NativeOperation),
    Sequence,
    Machine,
}

impl NodeKind {
    /// Lower-cased variant name, used as the node tag.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Symbol => "symbol",
            NodeKind::Integer => "integer",
            NodeKind::Float => "float",
            NodeKind::Hex => "hex",
            NodeKind::Bin => "bin",
            NodeKind::Vector => "vector",
            NodeKind::Map => "map",
            NodeKind::Command(_) => "command",
            NodeKind::Sequence => "sequence",
            NodeKind::Machine => "machine",
        }
    }

    /// Leaf values produced by the tokenizer.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            NodeKind::Symbol | NodeKind::Integer | NodeKind::Float | NodeKind::Hex | NodeKind::Bin
        )
    }
}

/// The scalar payload every node carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => write!(f, "{s}"),
            Scalar::Int(n) => write!(f, "{n}"),
            // Debug keeps the fractional part of whole floats: `3.0`, not `3`.
            Scalar::Float(n) => write!(f, "{n:?}"),
        }
    }
}

struct NodeData {
    kind: NodeKind,
    value: Scalar,
    slots: RefCell<IndexMap<String, Node>>,
    children: RefCell<Vec<Node>>,
}

/// Shared handle to a tree element. Cloning the handle does not copy the node;
/// equality is identity.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    fn new(kind: NodeKind, value: Scalar) -> Self {
        Self(Rc::new(NodeData {
            kind,
            value,
            slots: RefCell::new(IndexMap::new()),
            children: RefCell::new(Vec::new()),
        }))
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Symbol, Scalar::Str(name.into()))
    }

    pub fn integer(value: i64) -> Self {
        Self::new(NodeKind::Integer, Scalar::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::new(NodeKind::Float, Scalar::Float(value))
    }

    pub fn hex(value: i64) -> Self {
        Self::new(NodeKind::Hex, Scalar::Int(value))
    }

    pub fn bin(value: i64) -> Self {
        Self::new(NodeKind::Bin, Scalar::Int(value))
    }

    pub fn vector(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Vector, Scalar::Str(name.into()))
    }

    pub fn map(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Map, Scalar::Str(name.into()))
    }

    pub fn sequence(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Sequence, Scalar::Str(name.into()))
    }

    pub fn machine(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Machine, Scalar::Str(name.into()))
    }

    /// The value a step yields when it has nothing to return.
    pub fn unit() -> Self {
        Self::vector("")
    }

    /// Wraps a native operation, registered under the operation's own name.
    pub fn native(name: impl Into<String>, callback: Operation) -> Self {
        Self::from_operation(NativeOperation::new(name, callback))
    }

    fn from_operation(op: NativeOperation) -> Self {
        let name = op.name.clone();
        Self::new(NodeKind::Command(op), Scalar::Str(name))
    }

    /// Builds a command node; only invokable candidates are accepted.
    pub fn command(candidate: impl Into<Insertable>) -> Result<Self> {
        match candidate.into() {
            Insertable::Native(op) => Ok(Self::from_operation(op)),
            Insertable::Node(node) => Err(VmError::from(
                Diagnostic::new(
                    DiagnosticKind::Assertion,
                    format!("command: {} is not invokable", node.head("")),
                )
                .with_note(format!("offending tag: {}", node.tag())),
            )),
        }
    }

    pub fn parse_integer(text: &str) -> std::result::Result<Self, Diagnostic> {
        text.parse::<i64>()
            .map(Self::integer)
            .map_err(|err| literal_error("integer", text, err))
    }

    pub fn parse_float(text: &str) -> std::result::Result<Self, Diagnostic> {
        text.parse::<f64>()
            .map(Self::float)
            .map_err(|err| literal_error("float", text, err))
    }

    /// Parses `0x`-prefixed text. All 64 bits are accepted; the top bit lands
    /// in the sign, and rendering gives the same digits back.
    pub fn parse_hex(text: &str) -> std::result::Result<Self, Diagnostic> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        u64::from_str_radix(digits, 16)
            .map(|bits| Self::hex(bits as i64))
            .map_err(|err| literal_error("hex", text, err))
    }

    /// Parses `0b`-prefixed text, up to 64 digits.
    pub fn parse_bin(text: &str) -> std::result::Result<Self, Diagnostic> {
        let digits = text.strip_prefix("0b").unwrap_or(text);
        u64::from_str_radix(digits, 2)
            .map(|bits| Self::bin(bits as i64))
            .map_err(|err| literal_error("bin", text, err))
    }

    /// Returns node candidates unchanged and wraps native operations in a command.
    pub fn wrap(candidate: impl Into<Insertable>) -> Node {
        match candidate.into() {
            Insertable::Node(node) => node,
            Insertable::Native(op) => Self::from_operation(op),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn tag(&self) -> &'static str {
        self.0.kind.tag()
    }

    pub fn scalar(&self) -> &Scalar {
        &self.0.value
    }

    /// Printable identity of the node.
    pub fn val(&self) -> String {
        match (&self.0.kind, &self.0.value) {
            (NodeKind::Hex, Scalar::Int(n)) => format!("{n:x}"),
            (NodeKind::Bin, Scalar::Int(n)) => format!("{n:b}"),
            (_, value) => value.to_string(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.0.value {
            Scalar::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.0.value {
            Scalar::Float(n) => Some(n),
            Scalar::Int(n) => Some(n as f64),
            Scalar::Str(_) => None,
        }
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Binds the candidate under its own `val()`.
    pub fn bind(&self, candidate: impl Into<Insertable>) {
        let node = Self::wrap(candidate);
        let key = node.val();
        self.0.slots.borrow_mut().insert(key, node);
    }

    /// Binds the candidate under an explicit key.
    pub fn set(&self, key: impl Into<String>, candidate: impl Into<Insertable>) -> &Self {
        self.0
            .slots
            .borrow_mut()
            .insert(key.into(), Self::wrap(candidate));
        self
    }

    pub fn push(&self, candidate: impl Into<Insertable>) -> &Self {
        self.0.children.borrow_mut().push(Self::wrap(candidate));
        self
    }

    pub fn slot(&self, key: &str) -> Option<Node> {
        self.0.slots.borrow().get(key).cloned()
    }

    pub fn get(&self, key: &str) -> Result<Node> {
        self.slot(key).ok_or_else(|| {
            VmError::from(Diagnostic::new(
                DiagnosticKind::Key,
                format!("lookup: no slot `{key}` in {}", self.head("")),
            ))
        })
    }

    pub fn at(&self, index: usize) -> Result<Node> {
        let children = self.0.children.borrow();
        children.get(index).cloned().ok_or_else(|| {
            VmError::from(Diagnostic::new(
                DiagnosticKind::Index,
                format!(
                    "lookup: index {index} out of range for {} with {} children",
                    self.head(""),
                    children.len()
                ),
            ))
        })
    }

    /// Slot names in ascending lexicographic order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.slots.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.children.borrow().is_empty()
    }

    /// Short `<tag:val> @identity` header.
    pub fn head(&self, prefix: &str) -> String {
        format!(
            "{prefix}<{}:{}> @{:x}",
            self.tag(),
            self.val(),
            self.identity()
        )
    }

    /// Full indented rendering of the subtree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut path = Vec::new();
        self.dump_into(&mut out, &mut path, 0, "");
        out
    }

    fn dump_into(&self, out: &mut String, path: &mut Vec<usize>, depth: usize, prefix: &str) {
        if depth > 0 {
            out.push('\n');
        }
        for _ in 0..depth {
            out.push('\t');
        }
        out.push_str(&self.head(prefix));
        // Only nodes on the current path count: shared subtrees print in full.
        if path.contains(&self.identity()) {
            out.push_str(" <cycle>");
            return;
        }
        path.push(self.identity());
        for key in self.keys() {
            if let Some(child) = self.slot(&key) {
                child.dump_into(out, path, depth + 1, &format!("{key} = "));
            }
        }
        for (index, child) in self.children().iter().enumerate() {
            child.dump_into(out, path, depth + 1, &format!("{index}: "));
        }
        path.pop();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head(""))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dump())
    }
}

fn literal_error(kind: &str, text: &str, err: impl fmt::Display) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::Lexer,
        format!("invalid {kind} literal `{text}`: {err}"),
    )
}
