//! Error Module

use thiserror::Error;

/// Everything that can go wrong while parsing a makefile or running a
/// section. Parse errors abort the parse; `CyclicInvocation` aborts
/// execution. Individual shell command failures are not errors at this
/// level, they are reported and execution continues.
#[derive(Error, Debug)]
pub enum MakeError {
    #[error("File {path} does not exist")]
    ConfigNotFound { path: String },
    #[error("Could not read file {path}: {source}")]
    ReadFailure {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid variable declaration at line {line}")]
    MalformedDeclaration { line: usize },
    #[error("Invalid value for variable {name} on line {line}")]
    EmptyVariableValue { name: String, line: usize },
    #[error("Invalid section declaration at line {line}")]
    MalformedSectionHeader { line: usize },
    #[error("Command not in a section at line {line}")]
    CommandOutsideSection { line: usize },
    #[error("Undeclared/Uninitialized variable {name} on line {line}")]
    UnresolvedVariable { name: String, line: usize },
    #[error("Invalid section name or no commands in the section {name}")]
    UnknownOrEmptySection { name: String },
    #[error("Cyclic invocation of section {section}: {}", .chain.join(" -> "))]
    CyclicInvocation { section: String, chain: Vec<String> },
}
