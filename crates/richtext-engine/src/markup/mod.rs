//! Markup codec: the HTML subset the editor reads and writes.
//!
//! `serialize` is deterministic (attributes in name order, text and
//! attribute values entity-encoded) so that parsing its output gives back
//! the same tree.

mod lexer;
mod parser;
mod writer;

pub(crate) use parser::parse;
pub(crate) use writer::serialize;
