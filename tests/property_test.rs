use calc::error;
use calc::lang::{Name, Notation, Session, Status};
use calc::mach::{decode_index, encode_index, read_name, Listing, INDEX_WIDTH};
use proptest::prelude::*;

const MAX_INPUT_BYTES: usize = 256;

fn name(s: &str) -> Name {
    Name::new(s, &(0..0)).unwrap()
}

proptest! {
    #[test]
    fn index_survives_encoding(idx in any::<usize>(), tail in proptest::collection::vec(any::<u8>(), 0..4)) {
        let mut code = vec![];
        encode_index(idx, &mut code);
        prop_assert!(code.len() <= INDEX_WIDTH + 1);
        let len = code.len();
        code.extend_from_slice(&tail);
        prop_assert_eq!(decode_index(&code), Some((idx, len)));
    }

    #[test]
    fn decode_index_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..=16)) {
        if let Some((_, len)) = decode_index(&bytes) {
            prop_assert!(len <= bytes.len());
        }
    }

    #[test]
    fn names_survive_encoding(s in "[a-z][a-z0-9_]{0,12}") {
        let mut code = vec![];
        let n = name(&s);
        code.extend_from_slice(n.as_bytes());
        code.push(calc::lang::NAME_END);
        prop_assert_eq!(read_name(&code), Some((n, s.len() + 1)));
    }

    #[test]
    fn bc_input_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let mut s = Session::new(Notation::Bc);
        if s.parse_one_statement(&input).is_err() {
            prop_assert_eq!(s.status(), Status::Executable);
        }
        s.reset(error!(Interrupted));
        prop_assert_eq!(s.parse_one_statement("1"), Ok(Status::Executable));
        for ins in Listing::new(s.program().main().code()) {
            prop_assert!(ins.is_ok());
        }
    }

    #[test]
    fn dc_input_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_BYTES)) {
        let input = String::from_utf8_lossy(&bytes).into_owned();
        let mut s = Session::new(Notation::Dc);
        if s.parse_one_statement(&input).is_err() {
            prop_assert_eq!(s.balance(), 0);
        }
        for idx in 0..s.program().strings().len() {
            let _ = s.compile_string(idx);
        }
        for func in s.program().functions() {
            for ins in Listing::new(func.code()) {
                prop_assert!(ins.is_ok());
            }
        }
    }
}
