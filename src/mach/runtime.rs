use crate::lang::Error;

/// ## Executor capability
///
/// What the parser needs from whatever runs its output. The parser
/// calls `reset` after it has cleaned up its own state so runtime
/// stacks are cleared in lockstep, and reads `result_depth` when it
/// starts compiling the body of an executed dc string.
pub trait Executor {
    /// Clears runtime state after a failed or interrupted statement
    /// and returns the error to report.
    fn reset(&mut self, cause: Error) -> Error;
    /// Number of values on the result stack right now.
    fn result_depth(&self) -> usize;
}

/// Executor for sessions that only compile.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl Executor for Detached {
    fn reset(&mut self, cause: Error) -> Error {
        cause
    }
    fn result_depth(&self) -> usize {
        0
    }
}
