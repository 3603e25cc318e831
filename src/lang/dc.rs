use super::{parse::Parser, token::*, Error};
use crate::error;
use crate::mach::{Opcode, RESERVED_FUNCTIONS};

type Result<T> = std::result::Result<T, Error>;

/// Digits in `usize::MAX`, the width of a string function's name.
const STRING_NAME_WIDTH: usize = {
    let mut n = usize::max_value();
    let mut width = 0;
    while n != 0 {
        n /= 10;
        width += 1;
    }
    width
};

/// Name of the function a string literal is executed as.
pub fn string_function_name(idx: usize) -> String {
    format!("{:0width$}", idx, width = STRING_NAME_WIDTH)
}

/// Commands that compile to exactly one instruction.
fn direct(command: Command) -> Option<Opcode> {
    use Command::*;
    Some(match command {
        Plus => Opcode::Plus,
        Minus => Opcode::Minus,
        Multiply => Opcode::Multiply,
        Divide => Opcode::Divide,
        Modulus => Opcode::Modulus,
        Power => Opcode::Power,
        Divmod => Opcode::Divmod,
        Modexp => Opcode::Modexp,
        Sqrt => Opcode::Sqrt,
        Print => Opcode::Print,
        PrintPop => Opcode::PrintPop,
        PrintStream => Opcode::PrintStream,
        PrintStack => Opcode::PrintStack,
        Clear => Opcode::Clear,
        Duplicate => Opcode::Duplicate,
        Swap => Opcode::Swap,
        Pop => Opcode::Pop,
        StackLen => Opcode::StackLen,
        Length => Opcode::Length,
        ScaleFunc => Opcode::ScaleFunc,
        Asciify => Opcode::Asciify,
        Execute => Opcode::Execute,
        Quit => Opcode::Quit,
        NQuit => Opcode::NQuit,
        Ibase => Opcode::Ibase,
        Obase => Opcode::Obase,
        Scale => Opcode::Scale,
        _ => return None,
    })
}

fn comparison(command: Command) -> Option<Opcode> {
    use Command::*;
    Some(match command {
        Equal => Opcode::RelEq,
        Less => Opcode::RelLt,
        Greater => Opcode::RelGt,
        NotEqual => Opcode::RelNe,
        NotLess => Opcode::RelGe,
        NotGreater => Opcode::RelLe,
        _ => return None,
    })
}

/// Top level dc parse: the whole loaded text is one expression.
pub fn parse(p: &mut Parser) -> Result<()> {
    if p.token().is_eof() {
        return Err(error!(EndOfInput));
    }
    expression(p)
}

/// Parses until the input is used up. In no-call mode the balance
/// starts from the executor's result stack and the body ends with
/// `PopExec` so control returns to the caller of the string.
pub fn expression(p: &mut Parser) -> Result<()> {
    if p.st.mode.no_call {
        p.st.nbraces = p.result_depth();
    }
    while !p.token().is_eof() {
        if p.interrupted() {
            return Err(error!(Interrupted));
        }
        match p.token().clone() {
            Token::Command(command) => match direct(command) {
                Some(op) => {
                    inst(p, op)?;
                    p.next()?;
                }
                None => command_rule(p, command)?,
            },
            Token::Number(_) => {
                p.number()?;
                p.st.nbraces += 1;
                p.next()?;
            }
            Token::Str(text) => string(p, &text)?,
            _ => return Err(error!(BadToken, ..&p.column())),
        }
    }
    if p.st.mode.no_call {
        inst(p, Opcode::PopExec)?;
    }
    Ok(())
}

/// Emits `op` after checking that enough values are available for it.
fn inst(p: &mut Parser, op: Opcode) -> Result<()> {
    let arity = op.arity();
    let operands = arity.operands as usize;
    if p.st.nbraces < operands {
        return Err(error!(BadExpression, ..&p.column(); "STACK WOULD UNDERFLOW"));
    }
    p.emit(op)?;
    p.st.nbraces = p.st.nbraces - operands + arity.results as usize;
    Ok(())
}

fn command_rule(p: &mut Parser, command: Command) -> Result<()> {
    use Command::*;
    if let Some(op) = comparison(command) {
        return cond(p, op);
    }
    match command {
        Store => mem(p, Opcode::Var, true, true),
        StorePush => mem(p, Opcode::PushToVar, true, false),
        Load => mem(p, Opcode::Load, true, false),
        LoadPop => mem(p, Opcode::PushVar, true, false),
        ArrayStore => mem(p, Opcode::ArrayElem, true, true),
        ArrayLoad => mem(p, Opcode::ArrayElem, true, false),
        StoreIbase => mem(p, Opcode::Ibase, false, true),
        StoreObase => mem(p, Opcode::Obase, false, true),
        StoreScale => mem(p, Opcode::Scale, false, true),
        Negate => {
            p.next()?;
            match p.token() {
                Token::Number(_) => {}
                _ => return Err(error!(BadToken, ..&p.column(); "EXPECTED NUMBER")),
            }
            p.number()?;
            p.st.nbraces += 1;
            inst(p, Opcode::Neg)?;
            p.next()
        }
        Read => {
            if p.st.mode.no_read {
                return Err(error!(RecursiveRead, ..&p.column()));
            }
            inst(p, Opcode::Read)?;
            p.next()
        }
        _ => Err(error!(BadToken, ..&p.column())),
    }
}

fn register(p: &mut Parser) -> Result<Name> {
    p.next()?;
    match p.token().clone() {
        Token::Name(name) => Ok(name),
        _ => Err(error!(BadToken, ..&p.column(); "EXPECTED REGISTER")),
    }
}

/// Register access, optionally followed by the store sequence. The
/// register is read before anything is emitted.
fn mem(p: &mut Parser, op: Opcode, name: bool, store: bool) -> Result<()> {
    let reg = if name { Some(register(p)?) } else { None };
    inst(p, op)?;
    if let Some(reg) = reg {
        p.emit_name(reg)?;
    }
    if store {
        inst(p, Opcode::Swap)?;
        inst(p, Opcode::Assign)?;
        inst(p, Opcode::Pop)?;
    }
    p.next()
}

/// Comparison and conditional execution of a register, with an
/// optional else register.
fn cond(p: &mut Parser, op: Opcode) -> Result<()> {
    inst(p, op)?;
    let then = register(p)?;
    p.next()?;
    let other = if *p.token() == Token::Command(Command::Else) {
        let other = register(p)?;
        p.next()?;
        Some(other)
    } else {
        None
    };
    inst(p, Opcode::ExecCond)?;
    p.emit_name(then)?;
    match other {
        Some(other) => p.emit_name(other),
        None => p.emit_name_end(),
    }
}

/// Pools a string literal and registers the function it runs as. A
/// failure part way leaves the pool and table as they were.
fn string(p: &mut Parser, text: &str) -> Result<()> {
    let idx = p.prog.strings().len();
    let balance = p.st.nbraces;
    let code_len = p.code_len();
    match emit_string(p, idx, text) {
        Ok(func) => {
            debug_assert_eq!(func, idx + RESERVED_FUNCTIONS);
            p.next()
        }
        Err(e) => {
            if p.prog.strings().len() > idx {
                p.prog.pop_string();
            }
            p.st.nbraces = balance;
            p.truncate_code(code_len);
            Err(e)
        }
    }
}

fn emit_string(p: &mut Parser, idx: usize, text: &str) -> Result<usize> {
    let name = string_function_name(idx);
    inst(p, Opcode::Str)?;
    p.emit_index(idx)?;
    p.prog.append_string(text)?;
    p.register_function(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_function_name() {
        let name = string_function_name(7);
        assert_eq!(name.len(), usize::max_value().to_string().len());
        assert!(name.ends_with("0007"));
        assert!(string_function_name(10) > string_function_name(9));
    }

    #[test]
    fn test_direct_table() {
        assert_eq!(direct(Command::Plus), Some(Opcode::Plus));
        assert_eq!(direct(Command::Store), None);
        assert_eq!(comparison(Command::NotLess), Some(Opcode::RelGe));
        assert_eq!(comparison(Command::NotGreater), Some(Opcode::RelLe));
    }
}
