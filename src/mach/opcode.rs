use std::convert::TryFrom;

/// ## Virtual machine instruction set
///
/// Both notations compile to the same byte-coded instruction set.
/// Each instruction is one opcode byte, optionally followed by an
/// inline operand: an encoded index (`Num`, `Str`, `Jump`, `JumpZero`,
/// and the two indices of `Call`) or a name terminated by `NAME_END`
/// (register and variable access, and the one or two registers that
/// follow `ExecCond`).
///
/// For example: dc `3 4 + p` compiles to `[Num(0), Num(1), Plus, Print]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // *** Expression operations
    IncPre,
    DecPre,
    IncPost,
    DecPost,
    Neg,
    Power,
    Multiply,
    Divide,
    Modulus,
    Plus,
    Minus,
    RelEq,
    RelLe,
    RelGe,
    RelNe,
    RelLt,
    RelGt,
    BoolNot,
    BoolOr,
    BoolAnd,
    AssignPower,
    AssignMultiply,
    AssignDivide,
    AssignModulus,
    AssignPlus,
    AssignMinus,
    Assign,

    // *** Operands
    /// Push a constant. Followed by a constant pool index.
    Num,
    /// Push a variable reference. Followed by a name.
    Var,
    /// Pop an index, push an array element reference. Followed by a name.
    ArrayElem,
    /// Push a whole array reference. Followed by a name.
    Array,
    Scale,
    Last,
    Ibase,
    Obase,
    ScaleFunc,
    Length,
    Sqrt,
    Read,
    /// Push a string. Followed by a string pool index.
    Str,

    // *** Output
    Print,
    PrintPop,
    PrintStr,
    PrintStream,
    PrintStack,

    // *** Branch control
    /// Followed by a label index.
    Jump,
    /// Pop and branch if zero. Followed by a label index.
    JumpZero,
    /// Followed by the argument count and the function index.
    Call,
    Return,
    ReturnZero,
    Halt,
    Quit,
    NQuit,

    // *** Stack machine
    Pop,
    Swap,
    Duplicate,
    Clear,
    StackLen,
    Divmod,
    Modexp,
    Asciify,
    Execute,
    /// Pop a condition and execute the named register if it holds.
    /// Followed by the register name and either the else register or
    /// a lone `NAME_END`.
    ExecCond,
    /// Leave the frame of an executed string.
    PopExec,
    /// Push a register's value. Followed by a name.
    Load,
    /// Pop a register's stack. Followed by a name.
    PushVar,
    /// Push onto a register's stack. Followed by a name.
    PushToVar,
}

/// Values an instruction takes from and leaves on the result stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub operands: u8,
    pub results: u8,
}

const fn arity(operands: u8, results: u8) -> Arity {
    Arity { operands, results }
}

/// How the bytes after an opcode are to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Index,
    Name,
    Call,
    Cond,
}

impl Opcode {
    pub const ALL: [Opcode; 67] = {
        use Opcode::*;
        [
            IncPre, DecPre, IncPost, DecPost, Neg, Power, Multiply, Divide, Modulus, Plus, Minus,
            RelEq, RelLe, RelGe, RelNe, RelLt, RelGt, BoolNot, BoolOr, BoolAnd, AssignPower,
            AssignMultiply, AssignDivide, AssignModulus, AssignPlus, AssignMinus, Assign, Num,
            Var, ArrayElem, Array, Scale, Last, Ibase, Obase, ScaleFunc, Length, Sqrt, Read, Str,
            Print, PrintPop, PrintStr, PrintStream, PrintStack, Jump, JumpZero, Call, Return,
            ReturnZero, Halt, Quit, NQuit, Pop, Swap, Duplicate, Clear, StackLen, Divmod, Modexp,
            Asciify, Execute, ExecCond, PopExec, Load, PushVar, PushToVar,
        ]
    };

    /// Static operand/result counts used to check dc nesting at parse
    /// time. `Execute` is counted as leaving one value in place of the
    /// string it runs; `ExecCond` may not run anything, so it only
    /// consumes its condition.
    pub fn arity(self) -> Arity {
        use Opcode::*;
        match self {
            IncPre | DecPre | IncPost | DecPost | Neg | BoolNot => arity(1, 1),
            Power | Multiply | Divide | Modulus | Plus | Minus => arity(2, 1),
            RelEq | RelLe | RelGe | RelNe | RelLt | RelGt => arity(2, 1),
            BoolOr | BoolAnd => arity(2, 1),
            AssignPower | AssignMultiply | AssignDivide | AssignModulus | AssignPlus
            | AssignMinus | Assign => arity(2, 1),
            Num | Var | Array | Scale | Last | Ibase | Obase | Read | Str => arity(0, 1),
            ArrayElem | ScaleFunc | Length | Sqrt | Asciify => arity(1, 1),
            Print => arity(1, 1),
            PrintPop | PrintStr | PrintStream => arity(1, 0),
            PrintStack | Clear => arity(0, 0),
            Jump | Halt | Quit | Return | ReturnZero | PopExec => arity(0, 0),
            JumpZero | NQuit => arity(1, 0),
            Call => arity(0, 1),
            Pop => arity(1, 0),
            Swap => arity(2, 2),
            Duplicate => arity(1, 2),
            StackLen => arity(0, 1),
            Divmod => arity(2, 2),
            Modexp => arity(3, 1),
            Execute => arity(1, 1),
            ExecCond => arity(1, 0),
            Load | PushVar => arity(0, 1),
            PushToVar => arity(1, 0),
        }
    }

    pub fn operand_kind(self) -> OperandKind {
        use Opcode::*;
        match self {
            Num | Str | Jump | JumpZero => OperandKind::Index,
            Var | ArrayElem | Array | Load | PushVar | PushToVar => OperandKind::Name,
            Call => OperandKind::Call,
            ExecCond => OperandKind::Cond,
            _ => OperandKind::None,
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        use Opcode::*;
        Ok(match byte {
            0 => IncPre,
            1 => DecPre,
            2 => IncPost,
            3 => DecPost,
            4 => Neg,
            5 => Power,
            6 => Multiply,
            7 => Divide,
            8 => Modulus,
            9 => Plus,
            10 => Minus,
            11 => RelEq,
            12 => RelLe,
            13 => RelGe,
            14 => RelNe,
            15 => RelLt,
            16 => RelGt,
            17 => BoolNot,
            18 => BoolOr,
            19 => BoolAnd,
            20 => AssignPower,
            21 => AssignMultiply,
            22 => AssignDivide,
            23 => AssignModulus,
            24 => AssignPlus,
            25 => AssignMinus,
            26 => Assign,
            27 => Num,
            28 => Var,
            29 => ArrayElem,
            30 => Array,
            31 => Scale,
            32 => Last,
            33 => Ibase,
            34 => Obase,
            35 => ScaleFunc,
            36 => Length,
            37 => Sqrt,
            38 => Read,
            39 => Str,
            40 => Print,
            41 => PrintPop,
            42 => PrintStr,
            43 => PrintStream,
            44 => PrintStack,
            45 => Jump,
            46 => JumpZero,
            47 => Call,
            48 => Return,
            49 => ReturnZero,
            50 => Halt,
            51 => Quit,
            52 => NQuit,
            53 => Pop,
            54 => Swap,
            55 => Duplicate,
            56 => Clear,
            57 => StackLen,
            58 => Divmod,
            59 => Modexp,
            60 => Asciify,
            61 => Execute,
            62 => ExecCond,
            63 => PopExec,
            64 => Load,
            65 => PushVar,
            66 => PushToVar,
            _ => return Err(byte),
        })
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        let s = match self {
            IncPre => "INCPRE",
            DecPre => "DECPRE",
            IncPost => "INCPOST",
            DecPost => "DECPOST",
            Neg => "NEG",
            Power => "POWER",
            Multiply => "MUL",
            Divide => "DIV",
            Modulus => "MOD",
            Plus => "PLUS",
            Minus => "MINUS",
            RelEq => "EQ",
            RelLe => "LE",
            RelGe => "GE",
            RelNe => "NE",
            RelLt => "LT",
            RelGt => "GT",
            BoolNot => "NOT",
            BoolOr => "OR",
            BoolAnd => "AND",
            AssignPower => "ASSIGNPOWER",
            AssignMultiply => "ASSIGNMUL",
            AssignDivide => "ASSIGNDIV",
            AssignModulus => "ASSIGNMOD",
            AssignPlus => "ASSIGNPLUS",
            AssignMinus => "ASSIGNMINUS",
            Assign => "ASSIGN",
            Num => "NUM",
            Var => "VAR",
            ArrayElem => "ARRAYELEM",
            Array => "ARRAY",
            Scale => "SCALE",
            Last => "LAST",
            Ibase => "IBASE",
            Obase => "OBASE",
            ScaleFunc => "SCALEFUNC",
            Length => "LENGTH",
            Sqrt => "SQRT",
            Read => "READ",
            Str => "STR",
            Print => "PRINT",
            PrintPop => "PRINTPOP",
            PrintStr => "PRINTSTR",
            PrintStream => "PRINTSTREAM",
            PrintStack => "PRINTSTACK",
            Jump => "JUMP",
            JumpZero => "JUMPZERO",
            Call => "CALL",
            Return => "RETURN",
            ReturnZero => "RETURNZERO",
            Halt => "HALT",
            Quit => "QUIT",
            NQuit => "NQUIT",
            Pop => "POP",
            Swap => "SWAP",
            Duplicate => "DUP",
            Clear => "CLEAR",
            StackLen => "STACKLEN",
            Divmod => "DIVMOD",
            Modexp => "MODEXP",
            Asciify => "ASCIIFY",
            Execute => "EXECUTE",
            ExecCond => "EXECCOND",
            PopExec => "POPEXEC",
            Load => "LOAD",
            PushVar => "PUSHVAR",
            PushToVar => "PUSHTOVAR",
        };
        write!(f, "{}", s)
    }
}
