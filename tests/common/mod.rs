use calc::lang::{Error, ErrorCode};
use calc::mach::{Executor, Listing, Opcode, Program};

/// Executor stand-in with a settable result depth that records every
/// reset it is asked to perform.
#[derive(Debug, Default)]
pub struct Recorder {
    pub depth: usize,
    pub resets: Vec<ErrorCode>,
}

impl Executor for Recorder {
    fn reset(&mut self, cause: Error) -> Error {
        self.resets.push(cause.code());
        cause
    }
    fn result_depth(&self) -> usize {
        self.depth
    }
}

#[allow(dead_code)]
pub fn opcodes(program: &Program, func: usize) -> Vec<Opcode> {
    let code = program.function(func).unwrap().code();
    Listing::new(code).map(|i| i.unwrap().opcode).collect()
}
