//! Console reporting for section execution.
//!
//! These are the program's actual output channels, separate from the
//! diagnostic logger: a headline per executed command, its captured output
//! on the error or info channel, and the final completion line.

use colored::Colorize;

/// Prints the text of a command that just ran
pub fn headline(command: &str) {
    println!("{}", command.yellow().bold());
}

/// Prints the captured output of a failed command
pub fn error(output: &str) {
    println!("\t{}", output.red());
}

/// Prints the captured output of a successful command
pub fn info(output: &str) {
    println!("\t{}", output.white());
}

/// Prints the closing line once the requested section has run
pub fn finished(message: &str) {
    println!("{}", message.green());
}
