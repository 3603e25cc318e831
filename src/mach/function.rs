use super::encode::{encode_index, encode_name, INDEX_WIDTH};
use super::Opcode;
use crate::error;
use crate::lang::{Error, Name};

type Result<T> = std::result::Result<T, Error>;

/// Label offset that has been allocated but not yet placed.
pub const UNSET_LABEL: usize = usize::max_value();

/// A parameter or `auto` local.
#[derive(Debug, Clone, PartialEq)]
pub struct Auto {
    pub name: Name,
    pub array: bool,
}

/// ## Compiled function
///
/// Parameters come first in `autos`, followed by the locals from the
/// `auto` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    name: String,
    code: Vec<u8>,
    nparams: usize,
    autos: Vec<Auto>,
    labels: Vec<usize>,
}

fn reserve<T>(vec: &mut Vec<T>, additional: usize) -> Result<()> {
    vec.try_reserve(additional)
        .map_err(|_| error!(OutOfMemory; "CODE BUFFER"))
}

impl Function {
    pub fn new(name: &str) -> Function {
        Function {
            name: name.to_string(),
            code: vec![],
            nparams: 0,
            autos: vec![],
            labels: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn nparams(&self) -> usize {
        self.nparams
    }

    pub fn autos(&self) -> &[Auto] {
        &self.autos
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Forgets everything but the name so the slot can be defined again.
    pub fn clear(&mut self) {
        self.code.clear();
        self.nparams = 0;
        self.autos.clear();
        self.labels.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.code.truncate(len);
    }

    pub fn push_opcode(&mut self, op: Opcode) -> Result<()> {
        reserve(&mut self.code, 1)?;
        self.code.push(op.into());
        Ok(())
    }

    pub fn push_byte(&mut self, byte: u8) -> Result<()> {
        reserve(&mut self.code, 1)?;
        self.code.push(byte);
        Ok(())
    }

    pub fn push_index(&mut self, idx: usize) -> Result<()> {
        reserve(&mut self.code, INDEX_WIDTH + 1)?;
        encode_index(idx, &mut self.code);
        Ok(())
    }

    pub fn push_name(&mut self, name: &Name) -> Result<()> {
        reserve(&mut self.code, name.as_bytes().len() + 1)?;
        encode_name(name, &mut self.code);
        Ok(())
    }

    pub fn add_param(&mut self, name: Name, array: bool) -> Result<()> {
        debug_assert_eq!(self.nparams, self.autos.len());
        self.add_auto(name, array)?;
        self.nparams += 1;
        Ok(())
    }

    pub fn add_auto(&mut self, name: Name, array: bool) -> Result<()> {
        if self.autos.iter().any(|a| a.name == name && a.array == array) {
            return Err(error!(DuplicateLocal));
        }
        reserve(&mut self.autos, 1)?;
        self.autos.push(Auto { name, array });
        Ok(())
    }

    /// Allocates a label, placed at `offset` or left unset.
    pub fn add_label(&mut self, offset: Option<usize>) -> Result<usize> {
        reserve(&mut self.labels, 1)?;
        self.labels.push(offset.unwrap_or(UNSET_LABEL));
        Ok(self.labels.len() - 1)
    }

    /// Places a label at the current end of the code.
    pub fn set_label(&mut self, label: usize) {
        let len = self.code.len();
        if let Some(offset) = self.labels.get_mut(label) {
            *offset = len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    fn name(s: &str) -> Name {
        Name::new(s, &(0..0)).unwrap()
    }

    #[test]
    fn test_duplicate_local() {
        let mut f = Function::new("f");
        f.add_param(name("x"), false).unwrap();
        f.add_param(name("x"), true).unwrap();
        let e = f.add_auto(name("x"), false).unwrap_err();
        assert_eq!(e.code(), ErrorCode::DuplicateLocal);
        assert_eq!(f.nparams(), 2);
    }

    #[test]
    fn test_clear_keeps_name() {
        let mut f = Function::new("f");
        f.add_param(name("x"), false).unwrap();
        f.push_opcode(Opcode::ReturnZero).unwrap();
        let label = f.add_label(None).unwrap();
        assert_eq!(f.labels()[label], UNSET_LABEL);
        f.set_label(label);
        assert_eq!(f.labels()[label], 1);
        f.clear();
        assert_eq!(f.name(), "f");
        assert!(f.is_empty());
        assert_eq!(f.nparams(), 0);
        assert!(f.autos().is_empty());
        assert!(f.labels().is_empty());
    }
}
