//! # calc
//!
//! Front end for the two classic calculator languages: bc, the
//! C-like one, and dc, the reverse Polish one. Source text is parsed
//! one statement at a time into a bytecode program made of function
//! bodies, a constant pool, and a string pool.
//!
//! ```
//! use calc::lang::{Notation, Session};
//! use calc::mach::Listing;
//!
//! let mut session = Session::new(Notation::Bc);
//! session.parse_one_statement("define sq(x) { return x * x }").unwrap();
//! session.parse_one_statement("sq(3)").unwrap();
//! let range = session.take_statement();
//! let main = session.program().main();
//! for ins in Listing::range(main.code(), range) {
//!     println!("{}", ins.unwrap());
//! }
//! ```
//!
//! Nothing here evaluates numbers. A runtime plugs in through the
//! [`mach::Executor`] trait to learn about parse errors and to report
//! how many values a dc string will find on its stack.

pub mod lang;
pub mod mach;

#[doc(hidden)]
pub mod term;
