use std::io::Write;

use tracing::debug;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, VmError},
    node::{Flow, Node, NodeKind},
    parser::Parser,
    stdlib,
};

/// Width of the separator printed after a machine trace.
const SEPARATOR_WIDTH: usize = 0x22;

impl Node {
    /// Evaluates this node against an environment (normally the machine).
    pub fn evaluate(&self, env: &Node) -> Result<Flow> {
        match self.kind() {
            NodeKind::Integer | NodeKind::Float | NodeKind::Hex | NodeKind::Bin => {
                Ok(Flow::Value(self.clone()))
            }
            NodeKind::Symbol => {
                let name = self.val();
                env.slot(&name).map(Flow::Value).ok_or_else(|| {
                    VmError::from(
                        Diagnostic::new(DiagnosticKind::Key, format!("unbound symbol `{name}`"))
                            .with_note(format!("environment: {}", env.head(""))),
                    )
                })
            }
            NodeKind::Command(op) => {
                debug!(command = %op.name, "invoke");
                match op.call(env)? {
                    Flow::Next => Ok(Flow::Value(Node::unit())),
                    flow => Ok(flow),
                }
            }
            NodeKind::Sequence => {
                let mut last = None;
                for child in self.children() {
                    match child.evaluate(env)? {
                        Flow::Halt => return Ok(Flow::Halt),
                        Flow::Value(value) => last = Some(value),
                        Flow::Next => {}
                    }
                }
                Ok(Flow::Value(last.unwrap_or_else(Node::unit)))
            }
            NodeKind::Vector | NodeKind::Map | NodeKind::Machine => Err(VmError::from(
                Diagnostic::new(
                    DiagnosticKind::Type,
                    format!("evaluate: {} has no evaluation rule", self.tag()),
                )
                .with_note(format!("offending node: {}", self.head(""))),
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverOptions {
    /// Report the machine after every evaluation.
    pub trace_machine: bool,
}

/// Expression driver: evaluates each expression against one machine.
pub struct Interpreter {
    machine: Node,
    options: DriverOptions,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(DriverOptions::default())
    }

    pub fn with_options(options: DriverOptions) -> Self {
        let machine = Node::machine("FORTH");
        stdlib::install(&machine);
        Self { machine, options }
    }

    pub fn machine(&self) -> &Node {
        &self.machine
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Evaluates one expression against the machine. A symbol bound to a
    /// command runs that command; any other binding is the result itself.
    pub fn eval_node(&mut self, expr: &Node) -> Result<Flow> {
        debug!(expr = %expr.head(""), "evaluate");
        let flow = match expr.evaluate(&self.machine)? {
            Flow::Value(word) if matches!(word.kind(), NodeKind::Command(_)) => {
                word.evaluate(&self.machine)?
            }
            flow => flow,
        };
        if matches!(flow, Flow::Halt) {
            debug!("halt");
        }
        Ok(flow)
    }

    /// Evaluates every expression in `source`, writing a dump of each result
    /// to `out`. Stops early and returns `Flow::Halt` when the run is halted.
    pub fn run_source(&mut self, source: &str, out: &mut dyn Write) -> Result<Flow> {
        let mut parser = Parser::new(source);
        while let Some(expr) = parser.next_expression()? {
            match self.eval_node(&expr)? {
                Flow::Halt => return Ok(Flow::Halt),
                Flow::Value(value) => writeln!(out, "{}", value.dump())?,
                Flow::Next => {}
            }
            if self.options.trace_machine {
                writeln!(out, "{}", self.machine.dump())?;
                writeln!(out, "{}", "-".repeat(SEPARATOR_WIDTH))?;
            }
        }
        Ok(Flow::Next)
    }

    /// Evaluates every expression in `source` without reporting. The returned
    /// flows end with `Flow::Halt` if the run was halted.
    pub fn eval_source(&mut self, source: &str) -> Result<Vec<Flow>> {
        let mut flows = Vec::new();
        for expr in Parser::new(source) {
            let flow = self.eval_node(&expr?)?;
            let halted = matches!(flow, Flow::Halt);
            flows.push(flow);
            if halted {
                break;
            }
        }
        Ok(flows)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
