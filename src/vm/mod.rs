pub mod chunk;
pub mod compiler;
pub mod value;
#[allow(clippy::module_inception)]
pub mod vm;

pub use chunk::{Chunk, OpCode, disassemble};
pub use compiler::compile;
pub use value::Value;
pub use vm::Vm;

use crate::error::InterpretError;

/// Compile and run `source` on an existing VM. Each failure mode keeps its
/// own diagnostic shape; callers that report per-error (the CLI, the REPL)
/// use `compile` and `Vm::interpret` directly.
pub fn interpret(vm: &mut Vm, source: &str) -> Result<(), InterpretError> {
    let chunk = compile(source)?;
    vm.interpret(chunk)?;
    Ok(())
}
