//! `PairChat` — shared data model library.

pub mod change;
pub mod codec;
pub mod document;
pub mod user;
