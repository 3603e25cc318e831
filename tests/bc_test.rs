mod common;
use calc::lang::{Config, Notation, Session, Status};
use calc::mach::{Listing, Opcode, Operand, MAIN, RESERVED_FUNCTIONS};
use common::*;

fn bc() -> Session<Recorder> {
    Session::with_config(Config::default(), Recorder::default())
}

const FACTORIAL: &str = "
/* n! by iteration */
define f(n) {
    auto r, i
    r = 1
    for (i = 2; i <= n; i++) r *= i
    return (r)
}
";

#[test]
fn test_multi_line_definition() {
    let mut s = bc();
    let mut statuses = vec![];
    for line in FACTORIAL.lines() {
        statuses.push(s.parse_one_statement(line).unwrap());
    }
    assert_eq!(statuses.last(), Some(&Status::Executable));
    assert!(statuses.contains(&Status::Open));
    let f = s.program().function(RESERVED_FUNCTIONS).unwrap();
    assert_eq!(f.nparams(), 1);
    assert_eq!(f.autos().len(), 3);
    assert_eq!(f.labels().len(), 4);
    let last = Listing::new(f.code()).last().unwrap().unwrap();
    assert_eq!(last.opcode, Opcode::ReturnZero);
    assert!(s.program().main().is_empty());
    s.finalize().unwrap();
}

#[test]
fn test_whole_text_at_once() {
    let mut s = bc();
    assert_eq!(s.parse_one_statement(FACTORIAL), Ok(Status::Executable));
    assert_eq!(s.parse_one_statement("f(5)\n"), Ok(Status::Executable));
    let range = s.take_statement();
    let main = s.program().main();
    let v: Vec<_> = Listing::range(main.code(), range)
        .map(Result::unwrap)
        .collect();
    assert_eq!(v[1].operand, Operand::Call { args: 1, func: RESERVED_FUNCTIONS });
    assert_eq!(
        v.iter().map(|i| i.opcode).collect::<Vec<_>>(),
        vec![Opcode::Num, Opcode::Call, Opcode::Print, Opcode::Pop]
    );
}

#[test]
fn test_call_before_definition() {
    let mut s = bc();
    s.parse_one_statement("g(2)").unwrap();
    assert!(s.program().function(RESERVED_FUNCTIONS).unwrap().is_empty());
    s.parse_one_statement("define g(x) { return x }").unwrap();
    assert_eq!(s.program().functions().len(), RESERVED_FUNCTIONS + 1);
    use Opcode::*;
    assert_eq!(
        opcodes(s.program(), RESERVED_FUNCTIONS),
        vec![Var, Return, ReturnZero]
    );
}

#[test]
fn test_nested_if_else() {
    let mut s = bc();
    s.parse_one_statement("if (a) if (b) 1 else 2").unwrap();
    assert_eq!(s.status(), Status::Open);
    s.parse_one_statement("else 3").unwrap();
    assert_eq!(s.status(), Status::Executable);
    use Opcode::*;
    assert_eq!(
        opcodes(s.program(), MAIN),
        vec![
            Var, JumpZero, Var, JumpZero, Num, Print, Pop, Jump, Num, Print, Pop, Jump, Num,
            Print, Pop
        ]
    );
    assert_eq!(s.program().main().labels().len(), 4);
}

#[test]
fn test_while_with_braces_over_lines() {
    let mut s = bc();
    assert_eq!(s.parse_one_statement("while (i < 10) {"), Ok(Status::Open));
    assert_eq!(s.parse_one_statement("  i += 1; if (i == 5) break"), Ok(Status::Open));
    assert!(s.take_statement().is_empty());
    assert_eq!(s.parse_one_statement("}"), Ok(Status::Executable));
    let range = s.take_statement();
    assert_eq!(range, 0..s.program().main().len());
    let labels = s.program().main().labels();
    assert_eq!(labels.len(), 3);
    assert!(labels.iter().all(|&l| l <= range.end));
}
