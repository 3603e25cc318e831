/*!
## Rust Machine Module

The program representation shared by both notations: the opcode set,
the constant and string pools, the function table, and a disassembler
for compiled code. Execution lives behind the `Executor` trait.

*/

mod encode;
mod function;
mod listing;
mod opcode;
mod program;
mod runtime;
mod stack;

pub use encode::decode_index;
pub use encode::encode_index;
pub use encode::read_name;
pub use encode::INDEX_WIDTH;
pub use function::Auto;
pub use function::Function;
pub use function::UNSET_LABEL;
pub use listing::Instruction;
pub use listing::Listing;
pub use listing::Operand;
pub use opcode::Arity;
pub use opcode::Opcode;
pub use program::Program;
pub use program::{MAIN, READ, RESERVED_FUNCTIONS};
pub use runtime::Detached;
pub use runtime::Executor;
pub use stack::Stack;
