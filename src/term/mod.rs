extern crate ansi_term;
extern crate clap;
extern crate ctrlc;
extern crate linefeed;
use crate::lang::{Config, Error, Notation, Posix, Session, Status};
use crate::mach::{
    Detached, Function, Instruction, Listing, Opcode, Operand, Program, RESERVED_FUNCTIONS,
};
use ansi_term::Style;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use linefeed::{Interface, ReadResult};
use std::fs;
use std::io::{self, Write};
use std::ops::Range;
use std::sync::atomic::Ordering;

/// Compiles bc or dc source and lists the bytecode it produces.
#[derive(Parser, Debug)]
#[clap(name = "calc", version)]
struct Args {
    /// Source files, compiled after any -e and -f input
    files: Vec<String>,

    /// Compile dc instead of bc
    #[clap(long)]
    dc: bool,

    /// Compile an expression
    #[clap(short, long = "expression")]
    expressions: Vec<String>,

    /// Compile a file
    #[clap(short = 'f', long = "file")]
    input_files: Vec<String>,

    /// Read from the terminal after other input is done (bc)
    #[clap(short, long)]
    interactive: bool,

    /// Load the math library before other input (bc)
    #[clap(short = 'l', long)]
    mathlib: bool,

    /// Do not print the banner (bc)
    #[clap(short, long)]
    quiet: bool,

    /// Reject extensions to POSIX bc (bc)
    #[clap(short, long)]
    standard: bool,

    /// Warn about extensions to POSIX bc (bc)
    #[clap(short, long)]
    warn: bool,

    /// Whitespace before a register starts a whole-word register (dc)
    #[clap(short = 'x', long)]
    extended_register: bool,
}

impl Args {
    /// First option given that the chosen notation does not accept.
    fn misplaced_option(&self) -> Option<&'static str> {
        let bc_only = [
            (self.interactive, "--interactive"),
            (self.mathlib, "--mathlib"),
            (self.quiet, "--quiet"),
            (self.standard, "--standard"),
            (self.warn, "--warn"),
        ];
        if self.dc {
            bc_only.iter().find(|(given, _)| *given).map(|(_, name)| *name)
        } else if self.extended_register {
            Some("--extended-register")
        } else {
            None
        }
    }

    /// dc never prints a banner, and neither does bc given -e or -f.
    fn quiet(&self) -> bool {
        self.quiet || self.dc || !self.expressions.is_empty() || !self.input_files.is_empty()
    }

    fn config(&self) -> Config {
        Config {
            notation: if self.dc { Notation::Dc } else { Notation::Bc },
            extended_registers: self.extended_register,
            posix: if self.standard {
                Posix::Reject
            } else if self.warn {
                Posix::Warn
            } else {
                Posix::Allow
            },
        }
    }
}

pub fn main() {
    let args = Args::parse();
    if let Some(option) = args.misplaced_option() {
        let mode = if args.dc { "dc" } else { "bc" };
        Args::command()
            .error(
                ErrorKind::ArgumentConflict,
                format!("{} is not a {} option", option, mode),
            )
            .exit();
    }
    let mut session = Session::with_config(args.config(), Detached);
    let interrupt = session.interrupt_handle();
    ctrlc::set_handler(move || {
        interrupt.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    match main_loop(&args, &mut session, &mut io::stdout()) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(1);
        }
    }
}

/// Returns false when a fatal error ended the session.
fn main_loop(args: &Args, session: &mut Session, out: &mut dyn Write) -> io::Result<bool> {
    if args.mathlib {
        if let Err(error) = session.load_math_library() {
            report(&error, out)?;
            return Ok(false);
        }
        list_statement(session, out)?;
    }
    for expr in &args.expressions {
        if !enter(session, expr, out)? {
            return Ok(false);
        }
    }
    for filename in args.input_files.iter().chain(args.files.iter()) {
        let text = fs::read_to_string(filename)
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", filename, e)))?;
        let mut pending = String::new();
        for line in text.lines() {
            if !feed(session, &mut pending, line, out)? {
                return Ok(false);
            }
        }
        if !pending.is_empty() && !enter(session, &pending, out)? {
            return Ok(false);
        }
    }
    let has_input = !args.expressions.is_empty()
        || !args.input_files.is_empty()
        || !args.files.is_empty();
    if (args.interactive || !has_input) && !interactive(args, session)? {
        return Ok(false);
    }
    if let Err(error) = session.finalize() {
        report(&error, out)?;
        return Ok(false);
    }
    list_functions(session.program(), out)?;
    Ok(true)
}

fn interactive(args: &Args, session: &mut Session) -> io::Result<bool> {
    let name = match session.config().notation {
        Notation::Bc => "bc",
        Notation::Dc => "dc",
    };
    let interface = Interface::new(name)?;
    if !args.quiet() {
        interface.write_fmt(format_args!(
            "{} {} ({})\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            name
        ))?;
    }
    let mut pending = String::new();
    loop {
        let prompt = if !pending.is_empty() || session.status() == Status::Open {
            ". "
        } else {
            "> "
        };
        interface.set_prompt(prompt)?;
        let line = match interface.read_line()? {
            ReadResult::Input(line) => line,
            ReadResult::Signal(_) | ReadResult::Eof => break,
        };
        let mut buf = vec![];
        let keep_going = feed(session, &mut pending, &line, &mut buf)?;
        interface.write_fmt(format_args!("{}", String::from_utf8_lossy(&buf)))?;
        if !keep_going {
            return Ok(false);
        }
        interface.add_history_unique(line);
    }
    if pending.is_empty() {
        return Ok(true);
    }
    let mut buf = vec![];
    let keep_going = enter(session, &pending, &mut buf)?;
    interface.write_fmt(format_args!("{}", String::from_utf8_lossy(&buf)))?;
    Ok(keep_going)
}

/// Joins `line` to the text waiting in `pending` and compiles it once
/// no string or comment is left open.
fn feed(
    session: &mut Session,
    pending: &mut String,
    line: &str,
    out: &mut dyn Write,
) -> io::Result<bool> {
    if !pending.is_empty() {
        pending.push('\n');
    }
    pending.push_str(line);
    if session.needs_more(pending) {
        return Ok(true);
    }
    let text = std::mem::take(pending);
    enter(session, &text, out)
}

/// Compiles text and lists what became executable. Returns false on
/// a fatal error.
fn enter(session: &mut Session, text: &str, out: &mut dyn Write) -> io::Result<bool> {
    let result = session.parse_one_statement(text);
    for warning in session.take_warnings() {
        warn(&warning, out)?;
    }
    match result {
        Ok(_) => {
            list_statement(session, out)?;
            Ok(true)
        }
        Err(error) => {
            report(&error, out)?;
            Ok(!error.is_fatal())
        }
    }
}

fn list_statement(session: &mut Session, out: &mut dyn Write) -> io::Result<()> {
    let range = session.take_statement();
    let program = session.program();
    list(program, program.main(), range, out)
}

fn report(error: &Error, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", Style::new().bold().paint(error.to_string()))
}

fn warn(warning: &Error, out: &mut dyn Write) -> io::Result<()> {
    write!(out, "Warning: {}", warning.code())?;
    if let Some(line_number) = warning.line_number() {
        write!(out, " on line {}", line_number)?;
    }
    if !warning.detail().is_empty() {
        write!(out, "; {}", warning.detail())?;
    }
    writeln!(out)
}

fn list_functions(program: &Program, out: &mut dyn Write) -> io::Result<()> {
    for func in &program.functions()[RESERVED_FUNCTIONS..] {
        if func.is_empty() {
            continue;
        }
        writeln!(out, "{}:", func.name())?;
        list(program, func, 0..func.len(), out)?;
    }
    Ok(())
}

fn list(
    program: &Program,
    func: &Function,
    range: Range<usize>,
    out: &mut dyn Write,
) -> io::Result<()> {
    for ins in Listing::range(func.code(), range) {
        match ins {
            Ok(ins) => match annotation(program, &ins) {
                Some(note) => writeln!(out, "{:<24}; {}", ins.to_string(), note)?,
                None => writeln!(out, "{}", ins)?,
            },
            Err(offset) => writeln!(out, "{:5} ??", offset)?,
        }
    }
    Ok(())
}

fn annotation(program: &Program, ins: &Instruction) -> Option<String> {
    match (ins.opcode, &ins.operand) {
        (Opcode::Num, Operand::Index(idx)) => program.constant(*idx).map(str::to_string),
        (Opcode::Str, Operand::Index(idx)) => program.string(*idx).map(|s| format!("{:?}", s)),
        (Opcode::Call, Operand::Call { func, .. }) => {
            program.function(*func).map(|f| f.name().to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    fn source_file(name: &str, text: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("calc-{}-{}", std::process::id(), name));
        fs::write(&path, text).unwrap();
        path
    }

    fn run(argv: &[&str]) -> (Session, String) {
        let args = args(argv);
        let mut session = Session::with_config(args.config(), Detached);
        let mut out = vec![];
        assert!(main_loop(&args, &mut session, &mut out).unwrap());
        (session, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_listing_is_annotated() {
        let mut session = Session::new(Notation::Bc);
        let mut out = vec![];
        assert!(enter(&mut session, "x = 2; f(x)", &mut out).unwrap());
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("NUM"));
        assert!(s.contains("; 2"));
        assert!(s.contains("; f"));
    }

    #[test]
    fn test_errors_are_not_fatal() {
        let mut session = Session::new(Notation::Dc);
        let mut out = vec![];
        assert!(enter(&mut session, "+", &mut out).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("bad expression"));
    }

    #[test]
    fn test_function_listing() {
        let mut session = Session::new(Notation::Dc);
        session.parse_one_statement("[1p]").unwrap();
        session.compile_string(0).unwrap();
        let mut out = vec![];
        list_functions(session.program(), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("POPEXEC"));
    }

    #[test]
    fn test_dc_file_with_string_over_lines() {
        let path = source_file("string.dc", "[1\np]sa\n2 la x\n");
        let (session, out) = run(&["calc", "--dc", path.to_str().unwrap()]);
        fs::remove_file(&path).ok();
        assert!(!out.contains("error"), "{}", out);
        assert_eq!(session.program().strings(), &["1\np"]);
        assert!(out.contains("EXECUTE"));
    }

    #[test]
    fn test_bc_file_with_comment_over_lines() {
        let path = source_file("comment.bc", "/* header\n comment */\nx = 1\n\"a\nb\"\n");
        let (session, out) = run(&["calc", "-f", path.to_str().unwrap()]);
        fs::remove_file(&path).ok();
        assert!(!out.contains("error"), "{}", out);
        assert_eq!(session.program().strings(), &["a\nb"]);
        assert!(out.contains("ASSIGN"));
    }

    #[test]
    fn test_unterminated_string_at_end_of_file() {
        let path = source_file("open.dc", "1p\n[never\nclosed\n");
        let (session, out) = run(&["calc", "--dc", path.to_str().unwrap()]);
        fs::remove_file(&path).ok();
        assert!(out.contains("string end could not be found on line 2"), "{}", out);
        assert!(session.program().strings().is_empty());
    }

    #[test]
    fn test_feed_waits_for_comment_end() {
        let mut session = Session::new(Notation::Bc);
        let mut pending = String::new();
        let mut out = vec![];
        assert!(feed(&mut session, &mut pending, "/* open", &mut out).unwrap());
        assert_eq!(pending, "/* open");
        assert!(out.is_empty());
        assert!(feed(&mut session, &mut pending, "*/ 5", &mut out).unwrap());
        assert!(pending.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("; 5"));
    }

    #[test]
    fn test_options_follow_notation() {
        assert_eq!(args(&["calc", "--dc", "-i"]).misplaced_option(), Some("--interactive"));
        assert_eq!(args(&["calc", "--dc", "-l"]).misplaced_option(), Some("--mathlib"));
        assert_eq!(args(&["calc", "--dc", "-s"]).misplaced_option(), Some("--standard"));
        assert_eq!(args(&["calc", "-x"]).misplaced_option(), Some("--extended-register"));
        assert_eq!(args(&["calc", "--dc", "-x"]).misplaced_option(), None);
        assert_eq!(args(&["calc", "-i", "-q", "-w"]).misplaced_option(), None);
    }

    #[test]
    fn test_quiet_default() {
        assert!(!args(&["calc"]).quiet());
        assert!(args(&["calc", "-q"]).quiet());
        assert!(args(&["calc", "--dc"]).quiet());
        assert!(args(&["calc", "-e", "1"]).quiet());
        assert!(args(&["calc", "-f", "x.bc"]).quiet());
        assert!(!args(&["calc", "x.bc"]).quiet());
    }

    #[test]
    fn test_posix_options() {
        assert_eq!(args(&["calc", "-w"]).config().posix, Posix::Warn);
        assert_eq!(args(&["calc", "-s", "-w"]).config().posix, Posix::Reject);
        let (_, out) = run(&["calc", "-w", "-e", "halt"]);
        assert!(out.contains("Warning: not allowed by POSIX bc on line 1; HALT"), "{}", out);
        let (_, out) = run(&["calc", "-s", "-e", "halt"]);
        assert!(out.contains("POSIX error"), "{}", out);
    }

    #[test]
    fn test_math_library_option() {
        let (session, out) = run(&["calc", "-l", "-e", "s(1)"]);
        assert!(!out.contains("error"), "{}", out);
        assert!(out.contains("; 20"));
        assert!(session.program().function_index("a").is_some());
        assert!(out.contains("\ns:\n"));
    }
}
