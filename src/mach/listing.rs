use super::encode::{decode_index, read_name};
use super::opcode::{OperandKind, Opcode};
use crate::lang::{Name, NAME_END};
use std::convert::TryFrom;
use std::ops::Range;

/// Inline data decoded after an opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Index(usize),
    Name(Name),
    Cond(Name, Option<Name>),
    Call { args: usize, func: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Opcode,
    pub operand: Operand,
}

/// ## Disassembler
///
/// Walks a code buffer one instruction at a time. Iteration yields
/// `Err(offset)` once for the first byte that cannot be decoded and
/// then stops.
#[derive(Debug, Clone)]
pub struct Listing<'a> {
    code: &'a [u8],
    pos: usize,
    end: usize,
    failed: bool,
}

impl<'a> Listing<'a> {
    pub fn new(code: &'a [u8]) -> Listing<'a> {
        Listing {
            code,
            pos: 0,
            end: code.len(),
            failed: false,
        }
    }

    /// Lists part of a buffer. Offsets stay relative to the whole
    /// buffer so they match label values.
    pub fn range(code: &'a [u8], range: Range<usize>) -> Listing<'a> {
        let end = range.end.min(code.len());
        Listing {
            code,
            pos: range.start.min(end),
            end,
            failed: false,
        }
    }

    fn decode(&self) -> Option<(Instruction, usize)> {
        let code = &self.code[..self.end];
        let offset = self.pos;
        let opcode = Opcode::try_from(*code.get(offset)?).ok()?;
        let rest = &code[offset + 1..];
        let (operand, len) = match opcode.operand_kind() {
            OperandKind::None => (Operand::None, 0),
            OperandKind::Index => {
                let (idx, len) = decode_index(rest)?;
                (Operand::Index(idx), len)
            }
            OperandKind::Name => {
                let (name, len) = read_name(rest)?;
                (Operand::Name(name), len)
            }
            OperandKind::Call => {
                let (args, a) = decode_index(rest)?;
                let (func, b) = decode_index(&rest[a..])?;
                (Operand::Call { args, func }, a + b)
            }
            OperandKind::Cond => {
                let (then, a) = read_name(rest)?;
                if *rest.get(a)? == NAME_END {
                    (Operand::Cond(then, None), a + 1)
                } else {
                    let (other, b) = read_name(&rest[a..])?;
                    (Operand::Cond(then, Some(other)), a + b)
                }
            }
        };
        Some((
            Instruction {
                offset,
                opcode,
                operand,
            },
            1 + len,
        ))
    }
}

impl<'a> Iterator for Listing<'a> {
    type Item = Result<Instruction, usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.end {
            return None;
        }
        match self.decode() {
            Some((instruction, len)) => {
                self.pos += len;
                Some(Ok(instruction))
            }
            None => {
                self.failed = true;
                Some(Err(self.pos))
            }
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Index(idx) => write!(f, "{}", idx),
            Operand::Name(name) => write!(f, "{}", name),
            Operand::Cond(then, None) => write!(f, "{}", then),
            Operand::Cond(then, Some(other)) => write!(f, "{} e {}", then, other),
            Operand::Call { args, func } => write!(f, "{} {}", args, func),
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.operand == Operand::None {
            write!(f, "{:5} {}", self.offset, self.opcode)
        } else {
            write!(f, "{:5} {} {}", self.offset, self.opcode, self.operand)
        }
    }
}

impl<'a> std::fmt::Display for Listing<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for item in self.clone() {
            match item {
                Ok(instruction) => writeln!(f, "{}", instruction)?,
                Err(offset) => writeln!(f, "{:5} ?? {}", offset, self.code[offset])?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::encode::{encode_index, encode_name};

    fn name(s: &str) -> Name {
        Name::new(s, &(0..0)).unwrap()
    }

    #[test]
    fn test_decode() {
        let mut code = vec![Opcode::Num.into()];
        encode_index(300, &mut code);
        code.push(Opcode::ExecCond.into());
        encode_name(&name("a"), &mut code);
        code.push(NAME_END);
        code.push(Opcode::Call.into());
        encode_index(2, &mut code);
        encode_index(5, &mut code);
        let v: Vec<_> = Listing::new(&code).map(Result::unwrap).collect();
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].operand, Operand::Index(300));
        assert_eq!(v[1].offset, 4);
        assert_eq!(v[1].operand, Operand::Cond(name("a"), None));
        assert_eq!(v[2].operand, Operand::Call { args: 2, func: 5 });
    }

    #[test]
    fn test_bad_byte_stops() {
        let code = vec![Opcode::Print.into(), 250, Opcode::Print.into()];
        let v: Vec<_> = Listing::new(&code).collect();
        assert_eq!(v.len(), 2);
        assert_eq!(v[1], Err(1));
    }

    #[test]
    fn test_display() {
        let mut code = vec![Opcode::Load.into()];
        encode_name(&name("x"), &mut code);
        code.push(Opcode::Print.into());
        assert_eq!(
            Listing::new(&code).to_string(),
            "    0 LOAD x\n    3 PRINT\n"
        );
        assert_eq!(Listing::range(&code, 3..4).to_string(), "    3 PRINT\n");
    }
}
