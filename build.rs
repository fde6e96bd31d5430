use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Source directories that must follow the project's coding policy.
const SCANNED_ROOTS: [&str; 3] = ["design", "tests", "benches"];

// Words that mark change-log style comments, which belong in version control.
const CHANGE_LOG_WORDS: &str = "FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE";

#[derive(Clone, Copy)]
enum Policy {
    UnderscoreBinding,
    ChangeLogComment,
    StarsInComment,
    AllCapsComment,
    AllowDeadCode,
}

impl Policy {
    fn pattern(self) -> String {
        match self {
            Policy::UnderscoreBinding => r"\b(_[a-zA-Z0-9_]+)\b".to_string(),
            Policy::ChangeLogComment => format!(r"(//|/\*).*(?:{CHANGE_LOG_WORDS})"),
            Policy::StarsInComment => r"(//|/\*).*\*\*".to_string(),
            Policy::AllCapsComment => r"(//|/\*).*".to_string(),
            Policy::AllowDeadCode => r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]".to_string(),
        }
    }

    fn explanation(self) -> &'static str {
        match self {
            Policy::UnderscoreBinding => {
                "Underscore-prefixed variable names are not allowed in this project.\n   Either use the variable (removing the underscore) or remove it completely."
            }
            Policy::ChangeLogComment => {
                "Change-log comments (FIXED, NEW, UPDATED, ...) are not allowed.\n   Describe the code as it is; history lives in version control."
            }
            Policy::StarsInComment => {
                "The '**' pattern is not allowed in regular comments (but is allowed in doc comments)."
            }
            Policy::AllCapsComment => {
                "Comments where all alphabetic characters are uppercase are not allowed."
            }
            Policy::AllowDeadCode => {
                "#[allow(dead_code)] attributes are not allowed.\n   Either use the code or remove it completely."
            }
        }
    }

    // Decides whether a line returned by the regex is a real violation.
    fn is_violation(self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self {
            Policy::UnderscoreBinding => !is_comment(trimmed) && !underscore_only_in_string(line),
            Policy::ChangeLogComment | Policy::AllowDeadCode => true,
            Policy::StarsInComment => !is_doc_comment(trimmed),
            Policy::AllCapsComment => comment_text(line).is_some_and(|text| {
                let mut alpha = text.chars().filter(|c| c.is_alphabetic()).peekable();
                alpha.peek().is_some() && alpha.all(char::is_uppercase)
            }),
        }
    }
}

// Collects every violating line of one file for one policy.
struct PolicyCollector {
    policy: Policy,
    file_path: PathBuf,
    violations: Vec<String>,
}

impl PolicyCollector {
    fn new(policy: Policy, file_path: &Path) -> Self {
        Self {
            policy,
            file_path: file_path.to_path_buf(),
            violations: Vec::new(),
        }
    }

    fn check_and_get_error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} policy violations in {}:\n",
            self.violations.len(),
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!("\n⚠️ {}\n", self.policy.explanation()));

        Some(error_msg)
    }
}

impl Sink for PolicyCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if self.policy.is_violation(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }

        // Keep searching the rest of the file.
        Ok(true)
    }
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*")
}

fn is_doc_comment(trimmed: &str) -> bool {
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

// Odd-numbered segments of a quote split are inside string literals.
fn underscore_only_in_string(line: &str) -> bool {
    line.contains('"')
        && line
            .split('"')
            .enumerate()
            .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

// Extracts the text of a line comment or a single-line block comment.
fn comment_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix("///").or_else(|| trimmed.strip_prefix("//!")) {
        return Some(rest.trim());
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(rest.trim());
    }
    let start = line.find("/*")? + 2;
    let rest = &line[start..];
    Some(match rest.find("*/") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    })
}

fn rust_sources() -> impl Iterator<Item = PathBuf> {
    SCANNED_ROOTS.into_iter().flat_map(|root| {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
            .map(|e| e.into_path())
    })
}

fn scan(policy: Policy) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(&policy.pattern())?;
    let mut searcher = Searcher::new();

    for path in rust_sources() {
        let mut collector = PolicyCollector::new(policy, &path);
        searcher.search_path(&matcher, &path, &mut collector)?;

        if let Some(error_message) = collector.check_and_get_error_message() {
            return Err(error_message.into());
        }
    }

    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for root in SCANNED_ROOTS {
        println!("cargo:rerun-if-changed={root}");
    }

    let policies = [
        Policy::UnderscoreBinding,
        Policy::ChangeLogComment,
        Policy::StarsInComment,
        Policy::AllCapsComment,
        Policy::AllowDeadCode,
    ];

    for policy in policies {
        if let Err(e) = scan(policy) {
            // The `eprintln!` here is what shows the report in cargo's output.
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
