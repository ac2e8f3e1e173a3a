//! Runner Module

use crate::error::MakeError;
use crate::parser::Sections;
use crate::utils::log::{log, LogLevel};
use crate::utils::report;
use std::process::Command;

/// Result of one shell command: its combined stdout/stderr text and whether
/// it exited successfully.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub output: String,
    pub success: bool,
}

/// Executes a single literal command line and reports back its combined
/// output. The runner never interprets the command, the section executor
/// decides what is a command and what is a nested section.
pub trait CommandRunner {
    fn run(&self, command: &str) -> CommandOutcome;
}

/// Runs commands through the platform shell
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> CommandOutcome {
        log(LogLevel::Debug, &format!("Running: {}", command));
        #[cfg(target_os = "windows")]
        let output = Command::new("cmd").arg("/C").arg(command).output();
        #[cfg(not(target_os = "windows"))]
        let output = Command::new("sh").arg("-c").arg(command).output();
        match output {
            Ok(out) => {
                let mut combined = String::from_utf8_lossy(&out.stdout).to_string();
                combined.push_str(&String::from_utf8_lossy(&out.stderr));
                CommandOutcome {
                    output: combined,
                    success: out.status.success(),
                }
            }
            Err(why) => CommandOutcome {
                output: why.to_string(),
                success: false,
            },
        }
    }
}

/// Runs all the commands in a section, in declaration order.
///
/// A command whose uppercased text names a known section is executed as that
/// section, depth-first, before the next command is considered. Everything
/// else goes to the command runner; a failing command is reported and does
/// not stop the section. A section already on the active call chain must not
/// be entered again, that is a `CyclicInvocation` error.
pub fn run_section(
    section: &str,
    sections: &Sections,
    runner: &dyn CommandRunner,
) -> Result<(), MakeError> {
    let mut active: Vec<String> = Vec::new();
    run_section_inner(&section.to_uppercase(), sections, runner, &mut active)
}

fn run_section_inner(
    section: &str,
    sections: &Sections,
    runner: &dyn CommandRunner,
    active: &mut Vec<String>,
) -> Result<(), MakeError> {
    if active.iter().any(|name| name == section) {
        let mut chain = active.clone();
        chain.push(section.to_string());
        return Err(MakeError::CyclicInvocation {
            section: section.to_string(),
            chain,
        });
    }
    active.push(section.to_string());

    for command in sections.commands(section).unwrap_or(&[]) {
        let nested = command.to_uppercase();
        if sections.contains(&nested) {
            run_section_inner(&nested, sections, runner, active)?;
        } else {
            let outcome = runner.run(command);
            report::headline(command);
            if !outcome.success {
                report::error(&outcome.output);
            } else if !outcome.output.is_empty() {
                report::info(&outcome.output);
            }
        }
    }

    active.pop();
    Ok(())
}
