use super::lex::{self, BcLexer, DcLexer, TokenSource};
use super::parse::{Mode, ParseFn, ParseState, Parser, Posix};
use super::{bc, dc, Error};
use crate::error;
use crate::mach::{Detached, Executor, Opcode, Program, MAIN, READ, RESERVED_FUNCTIONS};
use std::ops::Range;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    Bc,
    Dc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub notation: Notation,
    /// dc registers may be whole identifiers after whitespace.
    pub extended_registers: bool,
    /// Treatment of bc extensions to POSIX bc.
    pub posix: Posix,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            notation: Notation::Bc,
            extended_registers: false,
            posix: Posix::Allow,
        }
    }
}

impl Config {
    fn mode(&self) -> Mode {
        Mode {
            posix: self.posix,
            ..Mode::default()
        }
    }
}

/// Standard bc math library, compiled by `Session::load_math_library`.
const MATH_LIBRARY: &str = include_str!("mathlib.bc");

/// Whether the code parsed so far may be handed to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Executable,
    /// A definition, block, or `if` awaiting its `else` is still open.
    Open,
}

struct Grammar {
    parse: ParseFn,
    read: ParseFn,
    finish: ParseFn,
}

fn nothing_to_finish(_: &mut Parser) -> Result<()> {
    Ok(())
}

static BC: Grammar = Grammar {
    parse: bc::parse,
    read: bc::read,
    finish: bc::finish,
};

static DC: Grammar = Grammar {
    parse: dc::parse,
    read: dc::parse,
    finish: nothing_to_finish,
};

/// ## Compile session
///
/// Owns one program and the parser state that builds it. Text is fed
/// in with `parse_one_statement`; any error resets the parser to the
/// top level of the main function and leaves the functions that were
/// already complete exactly as they were.
///
/// ```
/// use calc::lang::{Notation, Session, Status};
/// let mut session = Session::new(Notation::Dc);
/// assert_eq!(session.parse_one_statement("3 4 + p"), Ok(Status::Executable));
/// assert_eq!(session.program().constants(), &["3", "4"]);
/// ```
pub struct Session<E: Executor = Detached> {
    config: Config,
    grammar: &'static Grammar,
    program: Program,
    state: ParseState,
    lex: Box<dyn TokenSource>,
    executor: E,
    interrupt: Arc<AtomicBool>,
    line: usize,
    committed: usize,
    warnings: Vec<Error>,
}

impl Session<Detached> {
    pub fn new(notation: Notation) -> Session<Detached> {
        Session::with_config(
            Config {
                notation,
                ..Config::default()
            },
            Detached,
        )
    }
}

fn lexer(config: &Config) -> Box<dyn TokenSource> {
    match config.notation {
        Notation::Bc => Box::new(BcLexer::new()),
        Notation::Dc => Box::new(DcLexer::new(config.extended_registers)),
    }
}

/// Primes the lookahead and parses until the input is used up.
fn drive(p: &mut Parser, parse: ParseFn) -> Result<()> {
    p.next()?;
    loop {
        match parse(p) {
            Ok(()) => {}
            Err(e) if e.is_end_of_input() => return Ok(()),
            Err(e) => return Err(e),
        }
        if p.interrupted() {
            return Err(error!(Interrupted));
        }
    }
}

fn fail(p: &mut Parser, e: Error) -> Error {
    let e = e.in_column(&p.column());
    p.reset(e)
}

/// Places an error found in `text`, whose first line is `first`, on
/// the line holding its column.
fn locate(e: &Error, text: &str, first: usize) -> Error {
    let mut line = first;
    let mut line_start = 0;
    for (i, c) in text.chars().take(e.column().start).enumerate() {
        if c == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    e.at_line(Some(line), line_start)
}

impl<E: Executor> Session<E> {
    pub fn with_config(config: Config, executor: E) -> Session<E> {
        Session {
            config,
            grammar: match config.notation {
                Notation::Bc => &BC,
                Notation::Dc => &DC,
            },
            program: Program::new(),
            state: ParseState::new(MAIN, config.mode()),
            lex: lexer(&config),
            executor,
            interrupt: Arc::new(AtomicBool::new(false)),
            line: 0,
            committed: 0,
            warnings: vec![],
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    /// Flag that makes the session abandon the statement being parsed.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn status(&self) -> Status {
        if self.state.can_exec() {
            Status::Executable
        } else {
            Status::Open
        }
    }

    /// POSIX extensions met since the last call, when the session
    /// was configured with `Posix::Warn`.
    pub fn take_warnings(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.warnings)
    }

    /// True when `text` stops inside a string or comment, or on a bc
    /// line continuation. The caller should join the next line to it
    /// before parsing.
    pub fn needs_more(&self, text: &str) -> bool {
        if self.config.notation == Notation::Bc && text.ends_with('\\') {
            return true;
        }
        lex::ends_inside_literal(&mut *lexer(&self.config), text)
    }

    /// The dc operand balance carried between statements.
    pub fn balance(&self) -> usize {
        self.state.nbraces
    }

    /// Compiles every statement in `text` into the program. Each call
    /// starts a new line for error reports, and every newline inside
    /// `text` but a final one starts another.
    pub fn parse_one_statement(&mut self, text: &str) -> Result<Status> {
        let first = self.line + 1;
        let body = text.strip_suffix('\n').unwrap_or(text);
        self.line += 1 + body.matches('\n').count();
        self.lex.load(text);
        let parse = self.grammar.parse;
        let mut p = Parser::new(
            &mut self.state,
            &mut *self.lex,
            &mut self.program,
            &mut self.executor,
            &*self.interrupt,
        );
        let result = drive(&mut p, parse).map_err(|e| fail(&mut p, e));
        let warnings = std::mem::take(&mut self.state.warnings);
        self.warnings
            .extend(warnings.iter().map(|w| locate(w, text, first)));
        if let Err(e) = result {
            self.committed = self.program.main().len();
            return Err(locate(&e, text, first));
        }
        Ok(self.status())
    }

    /// Compiles the bc math library and sets `scale` to 20. The
    /// library does not count toward line numbers.
    pub fn load_math_library(&mut self) -> Result<()> {
        if self.config.notation != Notation::Bc {
            return Err(error!(NotExecutable; "MATH LIBRARY IS BC ONLY"));
        }
        let line = self.line;
        let result = self.parse_one_statement(MATH_LIBRARY);
        self.line = line;
        result.map(|_| ())
    }

    /// Called when input ends. Fails with `NotExecutable` if a
    /// definition or block was left open.
    pub fn finalize(&mut self) -> Result<()> {
        let finish = self.grammar.finish;
        let mut p = Parser::new(
            &mut self.state,
            &mut *self.lex,
            &mut self.program,
            &mut self.executor,
            &*self.interrupt,
        );
        let result = finish(&mut p).and_then(|()| {
            if p.st.can_exec() {
                Ok(())
            } else {
                Err(error!(NotExecutable))
            }
        });
        if let Err(e) = result {
            let e = fail(&mut p, e);
            self.committed = self.program.main().len();
            return Err(e);
        }
        Ok(())
    }

    /// Returns the main function code completed since the last call,
    /// or an empty range while something is still open.
    pub fn take_statement(&mut self) -> Range<usize> {
        let end = self.program.main().len();
        if self.status() == Status::Open || self.committed > end {
            return self.committed..self.committed;
        }
        let range = self.committed..end;
        self.committed = end;
        range
    }

    /// Abandons any partial statement, returning the parser to the top
    /// level. Calling it again changes nothing further.
    pub fn reset(&mut self, cause: Error) -> Error {
        let mut p = Parser::new(
            &mut self.state,
            &mut *self.lex,
            &mut self.program,
            &mut self.executor,
            &*self.interrupt,
        );
        let e = p.reset(cause);
        self.committed = self.program.main().len();
        e
    }

    /// Compiles the body of pooled string `index` into the function it
    /// runs as. The balance check starts from the executor's current
    /// result depth. A function that already has code is left alone.
    pub fn compile_string(&mut self, index: usize) -> Result<()> {
        if self.config.notation != Notation::Dc {
            return Err(error!(NotExecutable; "ONLY DC EXECUTES STRINGS"));
        }
        let text = match self.program.string(index) {
            Some(text) => text.to_string(),
            None => return Err(error!(BadToken; "NO SUCH STRING")),
        };
        let func = index + RESERVED_FUNCTIONS;
        match self.program.function(func) {
            Some(f) if !f.is_empty() => return Ok(()),
            Some(_) => {}
            None => return Err(error!(BadToken; "NO SUCH STRING")),
        }
        let mut state = ParseState::new(
            func,
            Mode {
                no_call: true,
                ..self.config.mode()
            },
        );
        let mut lex = DcLexer::new(self.config.extended_registers);
        lex.load(&text);
        let mut p = Parser::new(
            &mut state,
            &mut lex,
            &mut self.program,
            &mut self.executor,
            &*self.interrupt,
        );
        if let Err(e) = p.next().and_then(|()| dc::expression(&mut p)) {
            return Err(fail(&mut p, e));
        }
        Ok(())
    }

    /// Compiles input for `read` into the read function, ending it
    /// with `PopExec`. Reading again from inside it is an error.
    pub fn compile_read(&mut self, text: &str) -> Result<()> {
        if let Some(f) = self.program.function_mut(READ) {
            f.clear();
        }
        let mut state = ParseState::new(
            READ,
            Mode {
                no_read: true,
                ..self.config.mode()
            },
        );
        let mut lex = lexer(&self.config);
        lex.load(text);
        let read = self.grammar.read;
        let mut p = Parser::new(
            &mut state,
            &mut *lex,
            &mut self.program,
            &mut self.executor,
            &*self.interrupt,
        );
        let result = drive(&mut p, read)
            .and_then(|()| p.emit(Opcode::PopExec))
            .map_err(|e| fail(&mut p, e));
        self.warnings.append(&mut state.warnings);
        result
    }
}
