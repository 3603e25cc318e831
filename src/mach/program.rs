use super::Function;
use crate::error;
use crate::lang::Error;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, Error>;

/// Top level code.
pub const MAIN: usize = 0;
/// Scratch function that input for `read` is compiled into.
pub const READ: usize = 1;
/// User and string functions start here.
pub const RESERVED_FUNCTIONS: usize = 2;

/// ## Program representation
///
/// Constants, strings, and functions are append only. Indices handed
/// out by the `append_*` and `add_function` methods are embedded in
/// bytecode and stay valid for the life of the program.
#[derive(Debug)]
pub struct Program {
    consts: Vec<String>,
    strs: Vec<String>,
    fns: Vec<Function>,
    fn_map: HashMap<String, usize>,
}

impl Default for Program {
    fn default() -> Self {
        Program::new()
    }
}

fn grow<T>(vec: &mut Vec<T>, what: &'static str) -> Result<()> {
    vec.try_reserve(1).map_err(|_| error!(OutOfMemory; what))
}

impl Program {
    pub fn new() -> Program {
        let mut fn_map = HashMap::new();
        fn_map.insert("(main)".to_string(), MAIN);
        fn_map.insert("(read)".to_string(), READ);
        Program {
            consts: vec![],
            strs: vec![],
            fns: vec![Function::new("(main)"), Function::new("(read)")],
            fn_map,
        }
    }

    /// Registers a function. A name that is already known has its
    /// function cleared and keeps its index.
    pub fn add_function(&mut self, name: &str) -> Result<usize> {
        if let Some(&idx) = self.fn_map.get(name) {
            self.fns[idx].clear();
            return Ok(idx);
        }
        self.insert_function(name)
    }

    /// Index of a function, registering an empty one for names not
    /// seen yet so calls may come before definitions.
    pub fn function_or_insert(&mut self, name: &str) -> Result<usize> {
        match self.fn_map.get(name) {
            Some(&idx) => Ok(idx),
            None => self.insert_function(name),
        }
    }

    fn insert_function(&mut self, name: &str) -> Result<usize> {
        grow(&mut self.fns, "FUNCTION TABLE")?;
        let idx = self.fns.len();
        self.fns.push(Function::new(name));
        self.fn_map.insert(name.to_string(), idx);
        Ok(idx)
    }

    pub fn append_constant(&mut self, text: &str) -> Result<usize> {
        grow(&mut self.consts, "CONSTANT POOL")?;
        self.consts.push(text.to_string());
        Ok(self.consts.len() - 1)
    }

    pub fn append_string(&mut self, text: &str) -> Result<usize> {
        grow(&mut self.strs, "STRING POOL")?;
        self.strs.push(text.to_string());
        Ok(self.strs.len() - 1)
    }

    /// Withdraws the most recent string while its literal is still
    /// being parsed.
    pub(crate) fn pop_string(&mut self) {
        self.strs.pop();
    }

    pub fn constants(&self) -> &[String] {
        &self.consts
    }

    pub fn constant(&self, idx: usize) -> Option<&str> {
        self.consts.get(idx).map(String::as_str)
    }

    pub fn strings(&self) -> &[String] {
        &self.strs
    }

    pub fn string(&self, idx: usize) -> Option<&str> {
        self.strs.get(idx).map(String::as_str)
    }

    pub fn functions(&self) -> &[Function] {
        &self.fns
    }

    pub fn function(&self, idx: usize) -> Option<&Function> {
        self.fns.get(idx)
    }

    pub fn function_mut(&mut self, idx: usize) -> Option<&mut Function> {
        self.fns.get_mut(idx)
    }

    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.fn_map.get(name).copied()
    }

    pub fn main(&self) -> &Function {
        &self.fns[MAIN]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::Opcode;

    #[test]
    fn test_reserved_functions() {
        let p = Program::new();
        assert_eq!(p.functions().len(), RESERVED_FUNCTIONS);
        assert_eq!(p.function_index("(main)"), Some(MAIN));
        assert_eq!(p.function_index("(read)"), Some(READ));
    }

    #[test]
    fn test_redefine_reuses_slot() {
        let mut p = Program::new();
        let f = p.add_function("f").unwrap();
        assert_eq!(f, RESERVED_FUNCTIONS);
        p.function_mut(f).unwrap().push_opcode(Opcode::Halt).unwrap();
        assert_eq!(p.function_or_insert("f").unwrap(), f);
        assert_eq!(p.function(f).unwrap().len(), 1);
        assert_eq!(p.add_function("f").unwrap(), f);
        assert!(p.function(f).unwrap().is_empty());
        assert_eq!(p.function_or_insert("g").unwrap(), f + 1);
    }

    #[test]
    fn test_pools_are_dense() {
        let mut p = Program::new();
        assert_eq!(p.append_constant("3").unwrap(), 0);
        assert_eq!(p.append_constant("3").unwrap(), 1);
        assert_eq!(p.append_string("x").unwrap(), 0);
        assert_eq!(p.constants(), &["3".to_string(), "3".to_string()]);
        p.pop_string();
        assert!(p.strings().is_empty());
    }
}
