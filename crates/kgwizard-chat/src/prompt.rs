//! Prompt templates: header, instruction lines and tail with `{token}`
//! placeholders.
//!
//! A template directory holds up to three plain-text files named `header`,
//! `instructions` and `tail`. Only lines of `instructions` that start with
//! `-` are kept. Braces are escaped by doubling them (`{{`, `}}`).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use kgwizard_core::Result;
use tracing::debug;

/// Token → replacement text.
pub type Substitutions = HashMap<String, String>;

/// Follow-up prompt for every run after the first.
pub const ITERATION_PROMPT: &str = "Now let's go for optimize iteration number {number}";

const DEFAULT_HEADER: &str = include_str!("../assets/header");
const DEFAULT_INSTRUCTIONS: &str = include_str!("../assets/instructions");
const DEFAULT_TAIL: &str = include_str!("../assets/tail");

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Guidelines {
    pub header: Option<String>,
    pub instructions: Vec<String>,
    pub tail: Option<String>,
}

impl Guidelines {
    /// The template shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            header: Some(DEFAULT_HEADER.to_string()),
            instructions: instruction_lines(DEFAULT_INSTRUCTIONS),
            tail: Some(DEFAULT_TAIL.to_string()),
        }
    }

    /// Load a template directory; absent files leave their section empty.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read = |name: &str| -> Result<Option<String>> {
            let path = dir.join(name);
            if path.is_file() {
                Ok(Some(std::fs::read_to_string(path)?))
            } else {
                debug!("No {} in {}", name, dir.display());
                Ok(None)
            }
        };
        Ok(Self {
            header: read("header")?,
            instructions: read("instructions")?
                .map(|s| instruction_lines(&s))
                .unwrap_or_default(),
            tail: read("tail")?,
        })
    }

    /// Fill placeholders in every section.
    ///
    /// With `remove_not_found_tokens`, a section that references a token
    /// missing from `subs` is dropped. Otherwise it is kept verbatim.
    pub fn apply_substitutions(&self, subs: &Substitutions, remove_not_found_tokens: bool) -> Self {
        let apply = |section: &str| match fill(section, subs) {
            Ok(filled) => Some(filled),
            Err(missing) if remove_not_found_tokens => {
                debug!("Dropping prompt section using missing token '{}'", missing);
                None
            }
            Err(_) => Some(section.to_string()),
        };
        Self {
            header: self.header.as_deref().and_then(apply),
            instructions: self
                .instructions
                .iter()
                .filter_map(|line| apply(line))
                .collect(),
            tail: self.tail.as_deref().and_then(apply),
        }
    }
}

impl fmt::Display for Guidelines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n\n{}\n\n{}",
            self.header.as_deref().unwrap_or_default(),
            self.instructions.join("\n"),
            self.tail.as_deref().unwrap_or_default()
        )
    }
}

fn instruction_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|l| l.starts_with('-'))
        .map(|l| l.trim().to_string())
        .collect()
}

/// Replace `{token}` placeholders. Returns the first missing token on failure.
///
/// `{{` and `}}` render as literal braces; a lone brace that does not open a
/// well-formed placeholder is copied through.
pub fn fill(template: &str, subs: &Substitutions) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(is_brace) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        match tail[1..].find(is_brace) {
            Some(end) if tail[1..].as_bytes()[end] == b'}' => {
                let token = &tail[1..1 + end];
                match subs.get(token) {
                    Some(value) => out.push_str(value),
                    None => return Err(token.to_string()),
                }
                rest = &tail[end + 2..];
            }
            _ => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn is_brace(c: char) -> bool {
    c == '{' || c == '}'
}

/// The follow-up message for run `number`.
pub fn iteration_prompt(number: &str) -> String {
    ITERATION_PROMPT.replace("{number}", number)
}
