use super::{lex::TokenSource, token::*, Column, Error};
use crate::error;
use crate::mach::{Executor, Opcode, Program, Stack, MAIN, UNSET_LABEL};
use std::sync::atomic::{AtomicBool, Ordering};

type Result<T> = std::result::Result<T, Error>;

/// Parses from the current token onward. Returns an `EndOfInput`
/// error once the input is used up.
pub type ParseFn = fn(&mut Parser<'_>) -> Result<()>;

/// What bc does on meeting an extension to POSIX bc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posix {
    Allow,
    Warn,
    Reject,
}

impl Default for Posix {
    fn default() -> Self {
        Posix::Allow
    }
}

/// Restrictions for re-entrant parses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    /// Input being compiled for `read` may not read again.
    pub no_read: bool,
    /// Body of an executed dc string.
    pub no_call: bool,
    pub posix: Posix,
}

/// Expressions nested deeper than this are refused.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Top,
    Function,
    Body,
    If,
    Else,
    Loop,
}

/// An open bc construct. Unbraced bodies hold exactly one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub braced: bool,
    pub awaiting_body: bool,
    /// An `if` directly inside this block has ended and nothing has
    /// said yet whether an `else` follows.
    pub if_end: bool,
}

impl Block {
    pub fn new(kind: BlockKind) -> Block {
        Block {
            kind,
            braced: false,
            awaiting_body: kind != BlockKind::Top,
            if_end: false,
        }
    }
}

/// Label that is placed where a construct ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
    pub label: usize,
    pub is_loop: bool,
}

/// ## Parser state
///
/// Survives between calls so a bc definition or loop may span many
/// lines of input. The block stack always holds its `Top` entry.
#[derive(Debug)]
pub struct ParseState {
    pub func: usize,
    pub token: Token,
    pub column: Column,
    pub blocks: Stack<Block>,
    pub exits: Stack<Exit>,
    /// Labels that `continue` jumps to.
    pub conds: Stack<usize>,
    /// Running dc operand balance, or open brace count in bc.
    pub nbraces: usize,
    pub auto_part: bool,
    /// Expression nesting of the bc parser.
    pub depth: usize,
    /// Inside an `if`, `while`, or `for` condition.
    pub in_condition: bool,
    /// POSIX extensions noted under `Posix::Warn`.
    pub warnings: Vec<Error>,
    pub mode: Mode,
}

impl ParseState {
    pub fn new(func: usize, mode: Mode) -> ParseState {
        let mut blocks = Stack::new("BLOCKS NESTED TOO DEEPLY");
        blocks.push(Block::new(BlockKind::Top)).ok();
        ParseState {
            func,
            token: Token::Eof,
            column: 0..0,
            blocks,
            exits: Stack::new("BLOCKS NESTED TOO DEEPLY"),
            conds: Stack::new("LOOPS NESTED TOO DEEPLY"),
            nbraces: 0,
            auto_part: false,
            depth: 0,
            in_condition: false,
            warnings: vec![],
            mode,
        }
    }

    pub fn top(&self) -> &Block {
        match self.blocks.last() {
            Some(block) => block,
            None => unreachable!("block stack lost its base entry"),
        }
    }

    pub fn top_mut(&mut self) -> &mut Block {
        match self.blocks.last_mut() {
            Some(block) => block,
            None => unreachable!("block stack lost its base entry"),
        }
    }

    /// Nothing is open, so the code emitted so far may run.
    pub fn can_exec(&self) -> bool {
        self.blocks.len() == 1 && !self.top().if_end
    }
}

/// ## Parser
///
/// A short-lived view joining the persistent state with the token
/// source, the program being built, and the executor.
pub struct Parser<'a> {
    pub st: &'a mut ParseState,
    pub prog: &'a mut Program,
    lex: &'a mut dyn TokenSource,
    exec: &'a mut dyn Executor,
    signal: &'a AtomicBool,
}

impl<'a> Parser<'a> {
    pub fn new(
        st: &'a mut ParseState,
        lex: &'a mut dyn TokenSource,
        prog: &'a mut Program,
        exec: &'a mut dyn Executor,
        signal: &'a AtomicBool,
    ) -> Parser<'a> {
        Parser {
            st,
            prog,
            lex,
            exec,
            signal,
        }
    }

    pub fn next(&mut self) -> Result<()> {
        self.st.token = self.lex.next_token()?;
        self.st.column = self.lex.column();
        Ok(())
    }

    pub fn token(&self) -> &Token {
        &self.st.token
    }

    pub fn column(&self) -> Column {
        self.st.column.clone()
    }

    pub fn result_depth(&self) -> usize {
        self.exec.result_depth()
    }

    /// Consumes a pending interrupt request.
    pub fn interrupted(&self) -> bool {
        self.signal.swap(false, Ordering::SeqCst)
    }

    fn function(&mut self) -> &mut crate::mach::Function {
        let func = self.st.func;
        match self.prog.function_mut(func) {
            Some(f) => f,
            None => unreachable!("active function {} is not in the table", func),
        }
    }

    pub fn code_len(&mut self) -> usize {
        self.function().len()
    }

    /// Drops code emitted since the active function was `len` long.
    pub fn truncate_code(&mut self, len: usize) {
        self.function().truncate(len)
    }

    pub fn emit(&mut self, op: Opcode) -> Result<()> {
        self.function().push_opcode(op)
    }

    pub fn emit_index(&mut self, idx: usize) -> Result<()> {
        self.function().push_index(idx)
    }

    pub fn emit_name(&mut self, name: Name) -> Result<()> {
        self.function().push_name(&name)
    }

    /// Emits the lone terminator that marks a missing name.
    pub fn emit_name_end(&mut self) -> Result<()> {
        self.function().push_byte(super::NAME_END)
    }

    pub fn register_function(&mut self, name: &str) -> Result<usize> {
        self.prog.add_function(name)
    }

    pub fn add_label(&mut self, here: bool) -> Result<usize> {
        let offset = if here { Some(self.code_len()) } else { None };
        self.function().add_label(offset)
    }

    pub fn set_label(&mut self, label: usize) {
        debug_assert_eq!(self.function().labels().get(label), Some(&UNSET_LABEL));
        self.function().set_label(label)
    }

    pub fn add_param(&mut self, name: Name, array: bool) -> Result<()> {
        let col = self.column();
        self.function()
            .add_param(name, array)
            .map_err(|e| e.in_column(&col))
    }

    pub fn add_auto(&mut self, name: Name, array: bool) -> Result<()> {
        let col = self.column();
        self.function()
            .add_auto(name, array)
            .map_err(|e| e.in_column(&col))
    }

    /// Notes a construct that POSIX bc lacks.
    pub fn not_posix(&mut self, what: &'static str) -> Result<()> {
        let e = error!(NotPosix, ..&self.column(); what);
        match self.st.mode.posix {
            Posix::Allow => Ok(()),
            Posix::Warn => {
                self.st.warnings.push(e);
                Ok(())
            }
            Posix::Reject => Err(e),
        }
    }

    /// Pools the current number token and emits a `Num` for it.
    pub fn number(&mut self) -> Result<()> {
        let idx = match &self.st.token {
            Token::Number(text) => self.prog.append_constant(text)?,
            _ => return Err(error!(BadToken, ..&self.column(); "EXPECTED NUMBER")),
        };
        self.emit(Opcode::Num)?;
        self.emit_index(idx)
    }

    /// Abandons whatever was being parsed and returns to the top level
    /// of the main function. Functions finished before this statement
    /// are untouched; a function still being defined is emptied.
    pub fn reset(&mut self, cause: Error) -> Error {
        if self.st.func != MAIN {
            self.function().clear();
            self.st.func = MAIN;
        }
        self.lex.discard();
        self.st.token = Token::Eof;
        self.st.auto_part = false;
        self.st.nbraces = 0;
        self.st.depth = 0;
        self.st.in_condition = false;
        self.st.blocks.truncate(1);
        self.st.top_mut().if_end = false;
        self.st.exits.clear();
        self.st.conds.clear();
        self.exec.reset(cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{DcLexer, ErrorCode};
    use crate::mach::Detached;

    #[test]
    fn test_number_pools_text() {
        let mut st = ParseState::new(MAIN, Mode::default());
        let mut lex = DcLexer::new(false);
        let mut prog = Program::new();
        let mut exec = Detached;
        let signal = AtomicBool::new(false);
        let mut p = Parser::new(&mut st, &mut lex, &mut prog, &mut exec, &signal);
        p.lex.load("0.50");
        p.next().unwrap();
        p.number().unwrap();
        assert_eq!(p.prog.constants(), &["0.50".to_string()]);
        assert_eq!(
            p.prog.main().code(),
            &[Opcode::Num.into(), 0u8][..]
        );
        p.next().unwrap();
        assert_eq!(p.number().unwrap_err().code(), ErrorCode::BadToken);
    }

    #[test]
    fn test_reset_empties_function_being_defined() {
        let mut st = ParseState::new(MAIN, Mode::default());
        let mut lex = DcLexer::new(false);
        let mut prog = Program::new();
        let mut exec = Detached;
        let signal = AtomicBool::new(false);
        let mut p = Parser::new(&mut st, &mut lex, &mut prog, &mut exec, &signal);
        let f = p.register_function("f").unwrap();
        p.st.func = f;
        p.emit(Opcode::Halt).unwrap();
        p.add_label(true).unwrap();
        p.st.blocks.push(Block::new(BlockKind::Function)).unwrap();
        p.st.nbraces = 3;
        let e = p.reset(error!(BadToken));
        assert_eq!(e.code(), ErrorCode::BadToken);
        assert_eq!(p.st.func, MAIN);
        assert_eq!(p.st.blocks.len(), 1);
        assert_eq!(p.st.nbraces, 0);
        assert!(p.prog.function(f).unwrap().is_empty());
        assert!(p.prog.function(f).unwrap().labels().is_empty());
        assert!(p.token().is_eof());
    }

    #[test]
    fn test_not_posix() {
        let mut st = ParseState::new(MAIN, Mode::default());
        let mut lex = DcLexer::new(false);
        let mut prog = Program::new();
        let mut exec = Detached;
        let signal = AtomicBool::new(false);
        let mut p = Parser::new(&mut st, &mut lex, &mut prog, &mut exec, &signal);
        p.not_posix("HALT").unwrap();
        assert!(p.st.warnings.is_empty());
        p.st.mode.posix = Posix::Warn;
        p.not_posix("HALT").unwrap();
        assert_eq!(p.st.warnings.len(), 1);
        p.st.mode.posix = Posix::Reject;
        assert_eq!(p.not_posix("HALT").unwrap_err().code(), ErrorCode::NotPosix);
        p.st.depth = 9;
        p.reset(error!(NotPosix));
        assert_eq!(p.st.depth, 0);
        assert_eq!(p.st.warnings.len(), 1);
    }
}
