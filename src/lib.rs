//! A library for running sections of a simple makefile.
//!
//! A makefile here is a plain text file of named sections, each holding an
//! ordered list of shell command lines. Variables declared with `NAME = VALUE`
//! are substituted into commands at parse time through `$(NAME)` references,
//! and a command that names another section runs that section in place.
//!

/// Structured parse and execution errors
pub mod error;
/// Contains parse related functions
pub mod parser;
/// Contains code to run sections and shell commands
pub mod runner;
/// Contains logger and console reporting
pub mod utils;

#[macro_use]
extern crate lazy_static;
