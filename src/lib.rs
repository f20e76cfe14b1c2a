//! GEDCOM hierarchy reconstruction and date-period extraction.
//!
//! [`level_stack`] turns depth-prefixed lines into open/close signals,
//! [`period`] and [`extract`] strip date qualifiers such as "ABT" or
//! "BET … AND …", and [`builder`] combines them into a record tree.

pub mod builder;
pub mod error;
pub mod extract;
pub mod level_stack;
pub mod line;
pub mod period;
pub mod scanner;
