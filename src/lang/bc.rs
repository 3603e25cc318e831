use super::parse::{Block, BlockKind, Exit, Parser, MAX_NESTING};
use super::{token::*, Error, Name};
use crate::error;
use crate::mach::{Opcode, MAIN};

type Result<T> = std::result::Result<T, Error>;

/// What an expression left behind, as far as the statement around it
/// is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expr {
    Value,
    /// Something that can be assigned to.
    Named,
    /// Assignments and increments, which are not printed.
    Assignment,
    /// A whole array, only valid as a call argument.
    Array,
}

const LOOSEST: u8 = 8;

fn binary_level(op: Operator) -> Option<u8> {
    use Operator::*;
    match op {
        Power => Some(3),
        Multiply | Divide | Modulus => Some(4),
        Plus | Minus => Some(5),
        Assign | AssignPower | AssignMultiply | AssignDivide | AssignModulus | AssignPlus
        | AssignMinus => Some(6),
        Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual => Some(7),
        And | Or => Some(8),
        Increment | Decrement | Not => None,
    }
}

fn opcode(op: Operator) -> Opcode {
    use Operator::*;
    match op {
        Increment => Opcode::IncPre,
        Decrement => Opcode::DecPre,
        Power => Opcode::Power,
        Multiply => Opcode::Multiply,
        Divide => Opcode::Divide,
        Modulus => Opcode::Modulus,
        Plus => Opcode::Plus,
        Minus => Opcode::Minus,
        Equal => Opcode::RelEq,
        NotEqual => Opcode::RelNe,
        Less => Opcode::RelLt,
        LessEqual => Opcode::RelLe,
        Greater => Opcode::RelGt,
        GreaterEqual => Opcode::RelGe,
        Not => Opcode::BoolNot,
        And => Opcode::BoolAnd,
        Or => Opcode::BoolOr,
        Assign => Opcode::Assign,
        AssignPower => Opcode::AssignPower,
        AssignMultiply => Opcode::AssignMultiply,
        AssignDivide => Opcode::AssignDivide,
        AssignModulus => Opcode::AssignModulus,
        AssignPlus => Opcode::AssignPlus,
        AssignMinus => Opcode::AssignMinus,
    }
}

/// Top level bc parse: one statement, or one step of an `if` whose
/// `else` is still undecided.
pub fn parse(p: &mut Parser) -> Result<()> {
    while p.st.top().if_end {
        match p.token() {
            Token::Eof => return Err(error!(EndOfInput)),
            Token::Newline => return p.next(),
            Token::Word(Word::Else) => return else_branch(p),
            _ => {
                no_else(p);
                close_bodies(p)?;
            }
        }
    }
    match p.token() {
        Token::Eof => Err(error!(EndOfInput)),
        Token::Newline => p.next(),
        _ => statement(p),
    }
}

/// Input for `read()`: a single expression whose value is left for
/// the caller.
pub fn read(p: &mut Parser) -> Result<()> {
    if p.token().is_eof() {
        return Err(error!(EndOfInput));
    }
    let e = expression(p)?;
    value(p, e)?;
    if *p.token() == Token::Newline {
        p.next()?;
    }
    if !p.token().is_eof() {
        return Err(error!(BadExpression, ..&p.column(); "EXPECTED END OF INPUT"));
    }
    Ok(())
}

/// End of input settles an `if` that was waiting for its `else`.
pub fn finish(p: &mut Parser) -> Result<()> {
    while p.st.top().if_end {
        no_else(p);
        close_bodies(p)?;
    }
    Ok(())
}

fn statement(p: &mut Parser) -> Result<()> {
    if p.st.top().awaiting_body {
        if *p.token() == Token::LBrace {
            let top = p.st.top_mut();
            top.awaiting_body = false;
            top.braced = true;
            p.st.nbraces += 1;
            return p.next();
        }
        p.st.top_mut().awaiting_body = false;
    }
    let auto_part = std::mem::replace(&mut p.st.auto_part, false);
    match p.token().clone() {
        Token::Semicolon => {}
        Token::LBrace => {
            let mut block = Block::new(BlockKind::Body);
            block.braced = true;
            block.awaiting_body = false;
            p.st.blocks.push(block)?;
            p.st.nbraces += 1;
            return p.next();
        }
        Token::RBrace => return close_brace(p),
        Token::Str(text) => {
            let idx = p.prog.append_string(&text)?;
            p.emit(Opcode::Str)?;
            p.emit_index(idx)?;
            p.emit(Opcode::PrintStr)?;
            p.next()?;
        }
        Token::Word(word) => match word {
            Word::If => return if_header(p),
            Word::While => return while_header(p),
            Word::For => return for_header(p),
            Word::Define => return define(p),
            Word::Else => return Err(error!(BadToken, ..&p.column(); "ELSE WITHOUT IF")),
            Word::Auto if auto_part => auto(p)?,
            Word::Auto => return Err(error!(BadToken, ..&p.column(); "AUTO NOT FIRST IN FUNCTION")),
            Word::Break => jump_out(p, true)?,
            Word::Continue => {
                p.not_posix("CONTINUE")?;
                jump_out(p, false)?
            }
            Word::Return => r#return(p)?,
            Word::Print => {
                p.not_posix("PRINT")?;
                print(p)?
            }
            Word::Halt => {
                p.not_posix("HALT")?;
                p.emit(Opcode::Halt)?;
                p.next()?;
            }
            Word::Quit => {
                p.emit(Opcode::Quit)?;
                p.next()?;
            }
            Word::Ibase
            | Word::Obase
            | Word::Scale
            | Word::Last
            | Word::Length
            | Word::Sqrt
            | Word::Read => expression_statement(p)?,
        },
        _ => expression_statement(p)?,
    }
    end_statement(p)
}

fn end_statement(p: &mut Parser) -> Result<()> {
    close_bodies(p)?;
    match p.token() {
        Token::Semicolon | Token::Newline => p.next(),
        Token::Eof | Token::RBrace => Ok(()),
        Token::Word(Word::Else) if p.st.top().if_end => Ok(()),
        _ => Err(error!(BadToken, ..&p.column(); "EXPECTED END OF STATEMENT")),
    }
}

fn expect(p: &mut Parser, token: Token) -> Result<()> {
    if *p.token() == token {
        return p.next();
    }
    use Token::*;
    Err(error!(BadToken, ..&p.column();
        match token {
            LParen => "EXPECTED LEFT PARENTHESIS",
            RParen => "EXPECTED RIGHT PARENTHESIS",
            LBracket => "EXPECTED LEFT BRACKET",
            RBracket => "EXPECTED RIGHT BRACKET",
            LBrace => "EXPECTED LEFT BRACE",
            Semicolon => "EXPECTED SEMICOLON",
            _ => "UNEXPECTED TOKEN",
        }
    ))
}

fn push_block(p: &mut Parser, kind: BlockKind, exit: Exit) -> Result<()> {
    p.st.exits.push(exit)?;
    p.st.blocks.push(Block::new(kind))
}

/// Ends every unbraced body whose one statement is complete.
fn close_bodies(p: &mut Parser) -> Result<()> {
    loop {
        let top = p.st.top();
        if top.braced
            || top.awaiting_body
            || top.if_end
            || top.kind == BlockKind::Top
            || top.kind == BlockKind::Function
        {
            return Ok(());
        }
        end_block(p)?;
    }
}

fn end_block(p: &mut Parser) -> Result<()> {
    if p.st.blocks.len() <= 1 {
        return Err(error!(BadToken, ..&p.column(); "UNMATCHED BRACE"));
    }
    let kind = match p.st.blocks.pop() {
        Some(block) => block.kind,
        None => return Ok(()),
    };
    match kind {
        BlockKind::Top | BlockKind::Body => {}
        BlockKind::If => p.st.top_mut().if_end = true,
        BlockKind::Else => {
            if let Some(exit) = p.st.exits.pop() {
                p.set_label(exit.label);
            }
        }
        BlockKind::Loop => {
            if let Some(cond) = p.st.conds.pop() {
                p.emit(Opcode::Jump)?;
                p.emit_index(cond)?;
            }
            if let Some(exit) = p.st.exits.pop() {
                p.set_label(exit.label);
            }
        }
        BlockKind::Function => {
            p.emit(Opcode::ReturnZero)?;
            p.st.func = MAIN;
        }
    }
    Ok(())
}

fn close_brace(p: &mut Parser) -> Result<()> {
    if !p.st.top().braced || p.st.nbraces == 0 {
        return Err(error!(BadToken, ..&p.column(); "UNMATCHED BRACE"));
    }
    p.st.nbraces -= 1;
    end_block(p)?;
    p.next()?;
    end_statement(p)
}

fn no_else(p: &mut Parser) {
    p.st.top_mut().if_end = false;
    if let Some(exit) = p.st.exits.pop() {
        p.set_label(exit.label);
    }
}

fn else_branch(p: &mut Parser) -> Result<()> {
    p.not_posix("ELSE")?;
    p.st.top_mut().if_end = false;
    let end = p.add_label(false)?;
    p.emit(Opcode::Jump)?;
    p.emit_index(end)?;
    if let Some(exit) = p.st.exits.pop() {
        p.set_label(exit.label);
    }
    push_block(
        p,
        BlockKind::Else,
        Exit {
            label: end,
            is_loop: false,
        },
    )?;
    p.next()
}

fn condition(p: &mut Parser) -> Result<()> {
    let e = expression(p)?;
    value(p, e)
}

/// The condition of `if`, `while`, or `for`, the only place POSIX bc
/// allows a relational operator.
fn test(p: &mut Parser) -> Result<()> {
    let outer = std::mem::replace(&mut p.st.in_condition, true);
    condition(p)?;
    p.st.in_condition = outer;
    Ok(())
}

fn posix_name(p: &mut Parser, name: &Name) -> Result<()> {
    if name.as_str().len() > 1 {
        p.not_posix("NAME LONGER THAN ONE LETTER")?;
    }
    Ok(())
}

fn if_header(p: &mut Parser) -> Result<()> {
    p.next()?;
    expect(p, Token::LParen)?;
    test(p)?;
    expect(p, Token::RParen)?;
    let exit = p.add_label(false)?;
    p.emit(Opcode::JumpZero)?;
    p.emit_index(exit)?;
    push_block(
        p,
        BlockKind::If,
        Exit {
            label: exit,
            is_loop: false,
        },
    )
}

fn while_header(p: &mut Parser) -> Result<()> {
    p.next()?;
    expect(p, Token::LParen)?;
    let cond = p.add_label(true)?;
    p.st.conds.push(cond)?;
    test(p)?;
    expect(p, Token::RParen)?;
    let exit = p.add_label(false)?;
    p.emit(Opcode::JumpZero)?;
    p.emit_index(exit)?;
    push_block(
        p,
        BlockKind::Loop,
        Exit {
            label: exit,
            is_loop: true,
        },
    )
}

/// `for (init; cond; update)` lays out as init, cond, a jump over the
/// update to the body, then the update jumping back to cond.
fn for_header(p: &mut Parser) -> Result<()> {
    p.next()?;
    expect(p, Token::LParen)?;
    if *p.token() != Token::Semicolon {
        discarded(p)?;
    } else {
        p.not_posix("FOR WITHOUT INITIALIZER")?;
    }
    expect(p, Token::Semicolon)?;
    let cond = p.add_label(true)?;
    if *p.token() == Token::Semicolon {
        p.not_posix("FOR WITHOUT CONDITION")?;
        let one = p.prog.append_constant("1")?;
        p.emit(Opcode::Num)?;
        p.emit_index(one)?;
    } else {
        test(p)?;
    }
    expect(p, Token::Semicolon)?;
    let exit = p.add_label(false)?;
    p.emit(Opcode::JumpZero)?;
    p.emit_index(exit)?;
    let body = p.add_label(false)?;
    p.emit(Opcode::Jump)?;
    p.emit_index(body)?;
    let update = p.add_label(true)?;
    p.st.conds.push(update)?;
    if *p.token() != Token::RParen {
        discarded(p)?;
    } else {
        p.not_posix("FOR WITHOUT UPDATE")?;
    }
    p.emit(Opcode::Jump)?;
    p.emit_index(cond)?;
    expect(p, Token::RParen)?;
    p.set_label(body);
    push_block(
        p,
        BlockKind::Loop,
        Exit {
            label: exit,
            is_loop: true,
        },
    )
}

fn discarded(p: &mut Parser) -> Result<()> {
    let e = expression(p)?;
    value(p, e)?;
    p.emit(Opcode::Pop)
}

fn jump_out(p: &mut Parser, is_break: bool) -> Result<()> {
    let label = if is_break {
        p.st.exits.iter().rev().find(|e| e.is_loop).map(|e| e.label)
    } else {
        p.st.conds.last().copied()
    };
    let label = match label {
        Some(label) => label,
        None => return Err(error!(BadToken, ..&p.column(); "NOT INSIDE A LOOP")),
    };
    p.emit(Opcode::Jump)?;
    p.emit_index(label)?;
    p.next()
}

fn r#return(p: &mut Parser) -> Result<()> {
    if !p.st.blocks.iter().any(|b| b.kind == BlockKind::Function) {
        return Err(error!(BadToken, ..&p.column(); "RETURN OUTSIDE A FUNCTION"));
    }
    p.next()?;
    match p.token() {
        Token::Newline | Token::Semicolon | Token::Eof | Token::RBrace => {
            p.emit(Opcode::ReturnZero)
        }
        Token::LParen => {
            condition(p)?;
            p.emit(Opcode::Return)
        }
        _ => {
            p.not_posix("RETURN VALUE WITHOUT PARENTHESES")?;
            condition(p)?;
            p.emit(Opcode::Return)
        }
    }
}

fn print(p: &mut Parser) -> Result<()> {
    p.next()?;
    loop {
        if let Token::Str(text) = p.token().clone() {
            let idx = p.prog.append_string(&text)?;
            p.emit(Opcode::Str)?;
            p.emit_index(idx)?;
            p.emit(Opcode::PrintStr)?;
            p.next()?;
        } else {
            condition(p)?;
            p.emit(Opcode::PrintPop)?;
        }
        if *p.token() != Token::Comma {
            return Ok(());
        }
        p.next()?;
    }
}

fn local(p: &mut Parser) -> Result<(Name, bool)> {
    let name = match p.token().clone() {
        Token::Name(name) => name,
        _ => return Err(error!(BadToken, ..&p.column(); "EXPECTED NAME")),
    };
    posix_name(p, &name)?;
    p.next()?;
    if *p.token() == Token::LBracket {
        p.next()?;
        expect(p, Token::RBracket)?;
        return Ok((name, true));
    }
    Ok((name, false))
}

fn auto(p: &mut Parser) -> Result<()> {
    p.next()?;
    loop {
        let (name, array) = local(p)?;
        p.add_auto(name, array)?;
        if *p.token() != Token::Comma {
            return Ok(());
        }
        p.next()?;
    }
}

fn define(p: &mut Parser) -> Result<()> {
    if p.st.blocks.len() != 1 {
        return Err(error!(BadToken, ..&p.column(); "DEFINE INSIDE A BLOCK"));
    }
    p.next()?;
    let name = match p.token().clone() {
        Token::Name(name) => name,
        _ => return Err(error!(BadToken, ..&p.column(); "EXPECTED FUNCTION NAME")),
    };
    posix_name(p, &name)?;
    p.st.func = p.register_function(name.as_str())?;
    p.next()?;
    expect(p, Token::LParen)?;
    while *p.token() != Token::RParen {
        let (name, array) = local(p)?;
        p.add_param(name, array)?;
        match p.token() {
            Token::Comma => p.next()?,
            Token::RParen => {}
            _ => return Err(error!(BadToken, ..&p.column(); "EXPECTED COMMA")),
        }
    }
    p.next()?;
    expect(p, Token::LBrace)?;
    let mut block = Block::new(BlockKind::Function);
    block.braced = true;
    block.awaiting_body = false;
    p.st.blocks.push(block)?;
    p.st.nbraces += 1;
    p.st.auto_part = true;
    Ok(())
}

fn expression_statement(p: &mut Parser) -> Result<()> {
    match expression(p)? {
        Expr::Assignment => p.emit(Opcode::Pop),
        Expr::Array => Err(error!(BadExpression, ..&p.column(); "ARRAY USED AS A VALUE")),
        Expr::Value | Expr::Named => {
            p.emit(Opcode::Print)?;
            p.emit(Opcode::Pop)
        }
    }
}

fn value(p: &Parser, e: Expr) -> Result<()> {
    if e == Expr::Array {
        return Err(error!(BadExpression, ..&p.column(); "ARRAY USED AS A VALUE"));
    }
    Ok(())
}

fn expression(p: &mut Parser) -> Result<Expr> {
    binary(p, LOOSEST)
}

/// One level of expression nesting deeper. Every recursion of the
/// expression parser passes through here.
fn deeper(p: &mut Parser) -> Result<()> {
    if p.st.depth >= MAX_NESTING {
        return Err(error!(BadExpression, ..&p.column(); "EXPRESSION NESTED TOO DEEPLY"));
    }
    p.st.depth += 1;
    Ok(())
}

fn binary(p: &mut Parser, max: u8) -> Result<Expr> {
    deeper(p)?;
    let e = climb(p, max);
    p.st.depth -= 1;
    e
}

/// Precedence climbing over the binary operators no looser than `max`.
fn climb(p: &mut Parser, max: u8) -> Result<Expr> {
    let mut lhs = unary(p)?;
    loop {
        let op = match p.token() {
            Token::Operator(op) => *op,
            _ => return Ok(lhs),
        };
        let level = match binary_level(op) {
            Some(level) if level <= max => level,
            _ => return Ok(lhs),
        };
        value(p, lhs)?;
        if op == Operator::And || op == Operator::Or {
            p.not_posix("BOOLEAN OPERATOR")?;
        } else if op.is_relational() && !p.st.in_condition {
            p.not_posix("COMPARISON OUTSIDE A CONDITION")?;
        }
        if op.is_assignment() {
            if lhs != Expr::Named {
                return Err(error!(BadExpression, ..&p.column(); "ASSIGNMENT NEEDS A NAME"));
            }
            p.next()?;
            let rhs = binary(p, level)?;
            value(p, rhs)?;
            p.emit(opcode(op))?;
            lhs = Expr::Assignment;
        } else {
            p.next()?;
            let rhs = if op == Operator::Power {
                binary(p, level)?
            } else {
                binary(p, level - 1)?
            };
            value(p, rhs)?;
            p.emit(opcode(op))?;
            lhs = Expr::Value;
        }
    }
}

fn unary(p: &mut Parser) -> Result<Expr> {
    deeper(p)?;
    let e = prefix(p);
    p.st.depth -= 1;
    e
}

fn prefix(p: &mut Parser) -> Result<Expr> {
    match p.token() {
        Token::Operator(Operator::Minus) => {
            p.next()?;
            let e = unary(p)?;
            value(p, e)?;
            p.emit(Opcode::Neg)?;
            Ok(Expr::Value)
        }
        Token::Operator(Operator::Not) => {
            p.not_posix("BOOLEAN OPERATOR")?;
            p.next()?;
            let e = unary(p)?;
            value(p, e)?;
            p.emit(Opcode::BoolNot)?;
            Ok(Expr::Value)
        }
        Token::Operator(op @ Operator::Increment) | Token::Operator(op @ Operator::Decrement) => {
            let op = *op;
            p.next()?;
            if primary(p)? != Expr::Named {
                return Err(error!(BadExpression, ..&p.column(); "INCREMENT NEEDS A NAME"));
            }
            p.emit(opcode(op))?;
            Ok(Expr::Assignment)
        }
        _ => postfix(p),
    }
}

fn postfix(p: &mut Parser) -> Result<Expr> {
    let e = primary(p)?;
    if e != Expr::Named {
        return Ok(e);
    }
    let op = match p.token() {
        Token::Operator(Operator::Increment) => Opcode::IncPost,
        Token::Operator(Operator::Decrement) => Opcode::DecPost,
        _ => return Ok(e),
    };
    p.next()?;
    p.emit(op)?;
    Ok(Expr::Assignment)
}

fn primary(p: &mut Parser) -> Result<Expr> {
    match p.token().clone() {
        Token::Number(_) => {
            p.number()?;
            p.next()?;
            Ok(Expr::Value)
        }
        Token::LParen => {
            p.next()?;
            condition(p)?;
            expect(p, Token::RParen)?;
            Ok(Expr::Value)
        }
        Token::Name(name) => {
            posix_name(p, &name)?;
            p.next()?;
            match p.token() {
                Token::LParen => call(p, name),
                Token::LBracket => {
                    p.next()?;
                    if *p.token() == Token::RBracket {
                        p.next()?;
                        p.emit(Opcode::Array)?;
                        p.emit_name(name)?;
                        return Ok(Expr::Array);
                    }
                    condition(p)?;
                    expect(p, Token::RBracket)?;
                    p.emit(Opcode::ArrayElem)?;
                    p.emit_name(name)?;
                    Ok(Expr::Named)
                }
                _ => {
                    p.emit(Opcode::Var)?;
                    p.emit_name(name)?;
                    Ok(Expr::Named)
                }
            }
        }
        Token::Word(word) => {
            match word {
                Word::Last => p.not_posix("LAST")?,
                Word::Read => p.not_posix("READ")?,
                _ => {}
            }
            p.next()?;
            let op = match word {
                Word::Ibase => Opcode::Ibase,
                Word::Obase => Opcode::Obase,
                Word::Last => Opcode::Last,
                Word::Scale if *p.token() == Token::LParen => return builtin(p, Opcode::ScaleFunc),
                Word::Scale => Opcode::Scale,
                Word::Length => return builtin(p, Opcode::Length),
                Word::Sqrt => return builtin(p, Opcode::Sqrt),
                Word::Read => {
                    if p.st.mode.no_read {
                        return Err(error!(RecursiveRead, ..&p.column()));
                    }
                    expect(p, Token::LParen)?;
                    expect(p, Token::RParen)?;
                    p.emit(Opcode::Read)?;
                    return Ok(Expr::Value);
                }
                _ => return Err(error!(BadExpression, ..&p.column(); "EXPECTED EXPRESSION")),
            };
            p.emit(op)?;
            Ok(Expr::Named)
        }
        _ => Err(error!(BadExpression, ..&p.column(); "EXPECTED EXPRESSION")),
    }
}

fn builtin(p: &mut Parser, op: Opcode) -> Result<Expr> {
    expect(p, Token::LParen)?;
    condition(p)?;
    expect(p, Token::RParen)?;
    p.emit(op)?;
    Ok(Expr::Value)
}

fn call(p: &mut Parser, name: Name) -> Result<Expr> {
    expect(p, Token::LParen)?;
    let mut args = 0;
    if *p.token() != Token::RParen {
        loop {
            expression(p)?;
            args += 1;
            if *p.token() != Token::Comma {
                break;
            }
            p.next()?;
        }
    }
    expect(p, Token::RParen)?;
    let func = p.prog.function_or_insert(name.as_str())?;
    p.emit(Opcode::Call)?;
    p.emit_index(args)?;
    p.emit_index(func)?;
    Ok(Expr::Value)
}
