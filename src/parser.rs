//! Parsing Module

use crate::error::MakeError;
use crate::utils::log::{log, LogLevel};
use itertools::Itertools;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref COMMENT_RE: Regex = Regex::new(r"^ *#.*$").unwrap();
    static ref VAR_DECL_RE: Regex = Regex::new(r"^([A-Za-z0-9]+) *= *(.*)$").unwrap();
    static ref SECTION_RE: Regex = Regex::new(r"^([A-Za-z0-9]+): *$").unwrap();
    static ref VAR_REF_RE: Regex = Regex::new(r"\$\(([A-Za-z0-9]+)\)").unwrap();
}

/// Name of the pseudo-section that returns parsing to the global scope.
/// It never becomes a runnable section.
pub const GLOBAL_SECTION: &str = "GLOBAL";

/// A single lexical scope of variables, keyed by uppercased name.
///
/// One instance holds the globals of a makefile, another the locals of the
/// section currently being parsed. A stored empty string counts as absent.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    vars: HashMap<String, String>,
}

impl Scope {
    pub fn new() -> Self {
        Scope::default()
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_uppercase(), value.to_string());
    }

    /// Looks up a variable case-insensitively. Empty values are treated the
    /// same as undeclared ones.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars
            .get(&name.to_uppercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

/// All sections of a makefile, each an ordered list of resolved command
/// strings. A section exists from the moment its header is parsed, even if
/// it never receives a command.
#[derive(Debug, Default, Clone)]
pub struct Sections {
    map: HashMap<String, Vec<String>>,
}

impl Sections {
    pub fn new() -> Self {
        Sections::default()
    }

    /// Creates the section if it does not exist yet. Re-declaring keeps the
    /// commands parsed so far.
    pub fn declare(&mut self, name: &str) {
        self.map.entry(name.to_uppercase()).or_default();
    }

    pub fn push(&mut self, name: &str, command: String) {
        self.map.entry(name.to_uppercase()).or_default().push(command);
    }

    pub fn commands(&self, name: &str) -> Option<&[String]> {
        self.map.get(&name.to_uppercase()).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_uppercase())
    }

    /// A section can be requested for execution only if it exists and has at
    /// least one command.
    pub fn is_runnable(&self, name: &str) -> bool {
        self.commands(name).map_or(false, |cmds| !cmds.is_empty())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Classification of a single makefile line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Comment,
    Declaration { name: String, value: String },
    SectionHeader { name: String },
    Command { text: String },
    Blank,
}

/// Classifies one raw line. Matching order is fixed: comment, variable
/// declaration, section header, command; anything left after trimming that
/// matches none of the patterns is a command, an empty line is blank.
/// Identifiers are uppercased here so later stages never case-fold again.
pub fn classify(raw: &str, line_no: usize) -> Result<Line, MakeError> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(Line::Blank);
    }
    if COMMENT_RE.is_match(line) {
        return Ok(Line::Comment);
    }
    if VAR_DECL_RE.is_match(line) {
        let caps = VAR_DECL_RE
            .captures(line)
            .ok_or(MakeError::MalformedDeclaration { line: line_no })?;
        let name = caps
            .get(1)
            .ok_or(MakeError::MalformedDeclaration { line: line_no })?
            .as_str()
            .to_uppercase();
        let value = caps.get(2).map_or("", |m| m.as_str());
        if value.is_empty() {
            return Err(MakeError::EmptyVariableValue { name, line: line_no });
        }
        return Ok(Line::Declaration {
            name,
            value: value.to_string(),
        });
    }
    if SECTION_RE.is_match(line) {
        let name = SECTION_RE
            .captures(line)
            .and_then(|caps| caps.get(1))
            .ok_or(MakeError::MalformedSectionHeader { line: line_no })?
            .as_str()
            .to_uppercase();
        return Ok(Line::SectionHeader { name });
    }
    Ok(Line::Command {
        text: line.to_string(),
    })
}

/// Replaces every `$(NAME)` reference in the line with its value, checking
/// the local scope first and falling back to the global scope.
///
/// The reference list is collected up front, so a value that itself contains
/// reference syntax is inserted literally and not expanded again. A reference
/// found in neither scope fails the whole line.
pub fn substitute(
    line: &str,
    line_no: usize,
    locals: &Scope,
    globals: &Scope,
) -> Result<String, MakeError> {
    let references: Vec<&str> = VAR_REF_RE
        .find_iter(line)
        .map(|m| m.as_str())
        .unique()
        .collect();

    let mut resolved = line.to_string();
    for reference in references {
        // Strip the surrounding "$(" and ")"
        let name = reference[2..reference.len() - 1].to_uppercase();
        let value = locals
            .lookup(&name)
            .or_else(|| globals.lookup(&name))
            .ok_or_else(|| MakeError::UnresolvedVariable {
                name: name.clone(),
                line: line_no,
            })?;
        resolved = resolved.replace(reference, value);
    }

    Ok(resolved)
}

/// This function is used to parse a makefile
/// # Arguments
/// * `path` - The path to the makefile
/// * `wd` - The invoking working directory, exposed as the `DIR` global
pub fn parse_makefile(path: &str, wd: &str) -> Result<(Scope, Sections), MakeError> {
    let contents = read_file(path)?;
    parse_lines(&contents, wd)
}

/// Parses already-read makefile lines into the global scope and the section
/// map. Commands are stored with all variable references resolved.
pub fn parse_lines(lines: &[String], wd: &str) -> Result<(Scope, Sections), MakeError> {
    let mut globals = Scope::new();
    let mut locals = Scope::new();
    let mut sections = Sections::new();
    let mut current_section: Option<String> = None;

    globals.set("DIR", wd);

    for (i, raw) in lines.iter().enumerate() {
        let line_no = i + 1;
        match classify(raw, line_no)? {
            Line::Comment | Line::Blank => {}
            Line::Declaration { name, value } => match current_section {
                Some(_) => locals.set(&name, &value),
                None => globals.set(&name, &value),
            },
            Line::SectionHeader { name } => {
                // Every header opens a fresh local scope, the previous
                // section's locals are gone for good
                locals.clear();
                if name == GLOBAL_SECTION {
                    current_section = None;
                } else {
                    sections.declare(&name);
                    current_section = Some(name);
                }
            }
            Line::Command { text } => {
                let section = current_section
                    .as_deref()
                    .ok_or(MakeError::CommandOutsideSection { line: line_no })?;
                let resolved = substitute(&text, line_no, &locals, &globals)?;
                sections.push(section, resolved);
            }
        }
    }

    log(
        LogLevel::Debug,
        &format!("Parsed {} sections", sections.len()),
    );
    Ok((globals, sections))
}

/// Reads the makefile into lines
/// # Arguments
/// * `path` - The path to the makefile
fn read_file(path: &str) -> Result<Vec<String>, MakeError> {
    if !Path::new(path).exists() {
        return Err(MakeError::ConfigNotFound {
            path: path.to_string(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| MakeError::ReadFailure {
        path: path.to_string(),
        source,
    })?;
    Ok(contents.lines().map(str::to_owned).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_owned).collect()
    }

    #[test]
    fn test_classify_each_kind() {
        assert_eq!(classify("", 1).unwrap(), Line::Blank);
        assert_eq!(classify("   ", 1).unwrap(), Line::Blank);
        assert_eq!(classify("# a comment", 1).unwrap(), Line::Comment);
        assert_eq!(classify("   # indented comment", 1).unwrap(), Line::Comment);
        assert_eq!(
            classify("out = bin", 1).unwrap(),
            Line::Declaration {
                name: "OUT".to_string(),
                value: "bin".to_string()
            }
        );
        assert_eq!(
            classify("build:", 1).unwrap(),
            Line::SectionHeader {
                name: "BUILD".to_string()
            }
        );
        assert_eq!(
            classify("  gcc -o main main.c  ", 1).unwrap(),
            Line::Command {
                text: "gcc -o main main.c".to_string()
            }
        );
    }

    #[test]
    fn test_classify_near_miss_declaration_is_a_command() {
        // A space inside the name keeps the declaration pattern from
        // matching, the line falls through to a command
        assert_eq!(
            classify("FOO BAR = baz", 3).unwrap(),
            Line::Command {
                text: "FOO BAR = baz".to_string()
            }
        );
    }

    #[test]
    fn test_classify_header_with_trailing_text_is_a_command() {
        assert_eq!(
            classify("BUILD: echo hi", 2).unwrap(),
            Line::Command {
                text: "BUILD: echo hi".to_string()
            }
        );
    }

    #[test]
    fn test_classify_empty_value_fails() {
        let err = classify("OUT =", 7).unwrap_err();
        assert!(matches!(
            err,
            MakeError::EmptyVariableValue { ref name, line: 7 } if name == "OUT"
        ));
    }

    #[test]
    fn test_global_variable_is_retrievable_case_insensitively() {
        let (globals, _) = parse_lines(&lines("out = bin\n"), "/wd").unwrap();
        assert_eq!(globals.lookup("out"), Some("bin"));
        assert_eq!(globals.lookup("OUT"), Some("bin"));
    }

    #[test]
    fn test_dir_is_seeded_and_can_be_overridden() {
        let (globals, _) = parse_lines(&lines("A:\necho x\n"), "/work").unwrap();
        assert_eq!(globals.lookup("DIR"), Some("/work"));

        let (globals, _) = parse_lines(&lines("DIR = elsewhere\n"), "/work").unwrap();
        assert_eq!(globals.lookup("DIR"), Some("elsewhere"));
    }

    #[test]
    fn test_local_shadows_global() {
        let text = "OUT = global.bin\nBUILD:\nOUT = local.bin\necho $(OUT)\n";
        let (_, sections) = parse_lines(&lines(text), ".").unwrap();
        assert_eq!(
            sections.commands("BUILD").unwrap(),
            ["echo local.bin".to_string()]
        );
    }

    #[test]
    fn test_global_fallback_when_no_local() {
        let text = "OUT = global.bin\nBUILD:\necho $(OUT)\n";
        let (_, sections) = parse_lines(&lines(text), ".").unwrap();
        assert_eq!(
            sections.commands("BUILD").unwrap(),
            ["echo global.bin".to_string()]
        );
    }

    #[test]
    fn test_section_header_clears_locals() {
        let text = "A:\nX = one\nB:\necho $(X)\n";
        let err = parse_lines(&lines(text), ".").unwrap_err();
        assert!(matches!(
            err,
            MakeError::UnresolvedVariable { ref name, line: 4 } if name == "X"
        ));
    }

    #[test]
    fn test_redeclaring_same_section_clears_locals_and_appends() {
        let text = "A:\nX = one\necho $(X)\nA:\necho two\n";
        let err = parse_lines(&lines("A:\nX = one\nA:\necho $(X)\n"), ".").unwrap_err();
        assert!(matches!(err, MakeError::UnresolvedVariable { .. }));

        let (_, sections) = parse_lines(&lines(text), ".").unwrap();
        assert_eq!(
            sections.commands("A").unwrap(),
            ["echo one".to_string(), "echo two".to_string()]
        );
    }

    #[test]
    fn test_global_pseudo_section_returns_to_global_scope() {
        let text = "A:\necho x\nGLOBAL:\nY = yes\nB:\necho $(Y)\n";
        let (globals, sections) = parse_lines(&lines(text), ".").unwrap();
        assert_eq!(globals.lookup("Y"), Some("yes"));
        assert_eq!(sections.commands("B").unwrap(), ["echo yes".to_string()]);
        assert!(!sections.contains("GLOBAL"));
    }

    #[test]
    fn test_command_after_global_header_fails() {
        let text = "A:\necho x\nGLOBAL:\necho y\n";
        let err = parse_lines(&lines(text), ".").unwrap_err();
        assert!(matches!(err, MakeError::CommandOutsideSection { line: 4 }));
    }

    #[test]
    fn test_command_before_any_section_fails() {
        let err = parse_lines(&lines("echo hi\n"), ".").unwrap_err();
        assert!(matches!(err, MakeError::CommandOutsideSection { line: 1 }));
    }

    #[test]
    fn test_empty_section_exists_but_is_not_runnable() {
        let (_, sections) = parse_lines(&lines("EMPTY:\nFULL:\necho hi\n"), ".").unwrap();
        assert!(sections.contains("EMPTY"));
        assert!(!sections.is_runnable("EMPTY"));
        assert!(sections.is_runnable("full"));
        assert!(!sections.is_runnable("MISSING"));
    }

    #[test]
    fn test_duplicate_references_substitute_identically() {
        let mut globals = Scope::new();
        globals.set("V", "x");
        let resolved = substitute("$(V) and $(v) again", 1, &Scope::new(), &globals).unwrap();
        assert_eq!(resolved, "x and x again");
    }

    #[test]
    fn test_resolved_values_are_not_re_expanded() {
        let mut globals = Scope::new();
        globals.set("A", "$(B)");
        globals.set("B", "never");
        let resolved = substitute("echo $(A)", 1, &Scope::new(), &globals).unwrap();
        assert_eq!(resolved, "echo $(B)");
    }

    #[test]
    fn test_substitution_is_identity_without_references() {
        let resolved = substitute("echo plain text", 1, &Scope::new(), &Scope::new()).unwrap();
        assert_eq!(resolved, "echo plain text");
    }

    #[test]
    fn test_empty_scope_value_falls_through_to_global() {
        let mut locals = Scope::new();
        locals.set("V", "");
        let mut globals = Scope::new();
        globals.set("V", "fallback");
        let resolved = substitute("echo $(V)", 1, &locals, &globals).unwrap();
        assert_eq!(resolved, "echo fallback");
    }

    #[test]
    fn test_unresolved_reference_names_variable_and_line() {
        let err = substitute("echo $(NOPE)", 12, &Scope::new(), &Scope::new()).unwrap_err();
        assert!(matches!(
            err,
            MakeError::UnresolvedVariable { ref name, line: 12 } if name == "NOPE"
        ));
    }

    #[test]
    fn test_build_section_with_dir_override() {
        let text = "DIR = .\nBUILD:\n  OUT = out.bin\n  echo building $(OUT) in $(DIR)\n";
        let (globals, sections) = parse_lines(&lines(text), "/somewhere").unwrap();
        assert_eq!(globals.lookup("DIR"), Some("."));
        assert_eq!(
            sections.commands("BUILD").unwrap(),
            ["echo building out.bin in .".to_string()]
        );
    }

    #[test]
    fn test_parse_makefile_missing_file() {
        let err = parse_makefile("/no/such/makefile", ".").unwrap_err();
        assert!(matches!(
            err,
            MakeError::ConfigNotFound { ref path } if path == "/no/such/makefile"
        ));
    }

    #[test]
    fn test_parse_makefile_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("makefile");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "# sample\nALL:\necho $(DIR)\n").unwrap();

        let (_, sections) = parse_makefile(path.to_str().unwrap(), "/wd").unwrap();
        assert_eq!(sections.commands("ALL").unwrap(), ["echo /wd".to_string()]);
    }
}
