use tracing::debug;

use crate::{
    diagnostics::Result,
    node::{Flow, Node},
};

/// Registers the built-in vocabulary on a machine.
pub fn install(machine: &Node) {
    let nop = Node::native("nop", nop);
    let bye = Node::native("bye", bye);

    machine.bind(&nop);
    machine.bind(&bye);
    machine.set("?", Node::native("q", print_machine));
    machine.set(".", Node::native("dot", print_stack));

    // Only commands run from source; `hello` evaluates to the sequence itself.
    machine.bind(Node::sequence("hello").push(&nop).push(&bye));

    debug!(words = ?machine.keys(), "vocabulary installed");
}

fn nop(_env: &Node) -> Result<Flow> {
    Ok(Flow::Next)
}

fn bye(_env: &Node) -> Result<Flow> {
    Ok(Flow::Halt)
}

/// Yields the machine itself; the driver reports it.
fn print_machine(env: &Node) -> Result<Flow> {
    Ok(Flow::Value(env.clone()))
}

/// Yields a snapshot of the machine's auxiliary stack.
fn print_stack(env: &Node) -> Result<Flow> {
    let stack = Node::vector("stack");
    for item in env.children() {
        stack.push(item);
    }
    Ok(Flow::Value(stack))
}
