mod common;
use calc::error;
use calc::lang::{Config, ErrorCode, Notation, Session, Status};
use calc::mach::RESERVED_FUNCTIONS;
use common::*;
use std::sync::atomic::Ordering;

fn session(notation: Notation) -> Session<Recorder> {
    let config = Config {
        notation,
        ..Config::default()
    };
    Session::with_config(config, Recorder::default())
}

#[test]
fn test_finished_function_survives_bad_statement() {
    let mut s = session(Notation::Bc);
    s.parse_one_statement("define f(x) { return x * 2 }").unwrap();
    let before = s.program().function(RESERVED_FUNCTIONS).unwrap().clone();
    let e = s.parse_one_statement("1 +").unwrap_err();
    assert_eq!(e.code(), ErrorCode::BadExpression);
    assert_eq!(s.program().function(RESERVED_FUNCTIONS).unwrap(), &before);
    assert_eq!(s.executor().resets, vec![ErrorCode::BadExpression]);
    assert_eq!(s.status(), Status::Executable);
}

#[test]
fn test_partial_function_is_emptied() {
    let mut s = session(Notation::Bc);
    s.parse_one_statement("define f() { return 1 }").unwrap();
    s.parse_one_statement("define g(x) {").unwrap();
    s.parse_one_statement("x = x + 1").unwrap();
    assert_eq!(s.status(), Status::Open);
    assert!(s.parse_one_statement("while (x) { 1 +").is_err());
    let g = s.program().function(RESERVED_FUNCTIONS + 1).unwrap();
    assert_eq!(g.name(), "g");
    assert!(g.is_empty());
    assert_eq!(g.nparams(), 0);
    assert!(!s.program().function(RESERVED_FUNCTIONS).unwrap().is_empty());
    assert_eq!(s.status(), Status::Executable);
    assert_eq!(s.parse_one_statement("g(1)"), Ok(Status::Executable));
}

#[test]
fn test_reset_twice_changes_nothing() {
    let mut s = session(Notation::Bc);
    s.parse_one_statement("define f() {").unwrap();
    s.parse_one_statement("if (1) {").unwrap();
    s.reset(error!(Interrupted));
    let functions = s.program().functions().to_vec();
    let main = s.program().main().len();
    s.reset(error!(Interrupted));
    assert_eq!(s.program().functions(), &functions[..]);
    assert_eq!(s.program().main().len(), main);
    assert_eq!(s.status(), Status::Executable);
    assert_eq!(s.balance(), 0);
    assert_eq!(s.executor().resets.len(), 2);
}

#[test]
fn test_failed_statement_is_never_handed_out() {
    let mut s = session(Notation::Dc);
    s.parse_one_statement("1 2").unwrap();
    assert_eq!(s.take_statement(), 0..s.program().main().len());
    assert!(s.parse_one_statement("3 4 5 sa ++++").is_err());
    let end = s.program().main().len();
    assert!(end > 0);
    assert!(s.take_statement().is_empty());
    s.parse_one_statement("6").unwrap();
    let range = s.take_statement();
    assert_eq!(range.start, end);
    assert_eq!(range.end, s.program().main().len());
}

#[test]
fn test_balance_is_cleared_by_errors() {
    let mut s = session(Notation::Dc);
    s.parse_one_statement("1 2 3").unwrap();
    assert_eq!(s.balance(), 3);
    assert!(s.parse_one_statement("lq q x y z @").is_err());
    assert_eq!(s.balance(), 0);
    let e = s.parse_one_statement("+").unwrap_err();
    assert_eq!(e.code(), ErrorCode::BadExpression);
}

#[test]
fn test_errors_carry_line_and_column() {
    let mut s = session(Notation::Bc);
    s.parse_one_statement("1").unwrap();
    s.parse_one_statement("2").unwrap();
    let e = s.parse_one_statement("3 + )").unwrap_err();
    assert_eq!(e.line_number(), Some(3));
    assert_eq!(e.column(), 4..5);
    assert!(e.to_string().contains("on line 3"));
}

#[test]
fn test_interrupt_resets_executor() {
    let mut s = session(Notation::Dc);
    s.interrupt_handle().store(true, Ordering::SeqCst);
    let e = s.parse_one_statement("1 2 3").unwrap_err();
    assert_eq!(e.code(), ErrorCode::Interrupted);
    assert_eq!(s.executor().resets, vec![ErrorCode::Interrupted]);
    assert_eq!(s.balance(), 0);
    assert_eq!(s.parse_one_statement("1"), Ok(Status::Executable));
}

#[test]
fn test_finalize_reports_open_block() {
    let mut s = session(Notation::Bc);
    s.parse_one_statement("while (1) {").unwrap();
    let e = s.finalize().unwrap_err();
    assert_eq!(e.code(), ErrorCode::NotExecutable);
    assert_eq!(s.status(), Status::Executable);
    assert_eq!(s.executor().resets, vec![ErrorCode::NotExecutable]);
    assert_eq!(s.parse_one_statement("1"), Ok(Status::Executable));
}
