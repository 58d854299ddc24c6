//! YAML error diagnostics pointing at the failing line

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(qf::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("cannot read {path:?}")]
    #[diagnostic(code(qf::yaml::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convert a 1-based line/column to a byte offset, clamped to the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        match source.match_indices('\n').nth(line - 2) {
            Some((idx, _)) => idx + 1,
            None => return source.len().saturating_sub(1),
        }
    };

    let line_text = source[line_start..].split('\n').next().unwrap_or("");
    let col_offset = line_text
        .char_indices()
        .nth(column.saturating_sub(1))
        .map_or(line_text.len(), |(i, _)| i);

    (line_start + col_offset).min(source.len().saturating_sub(1))
}

/// Suggestions for the mistakes people make in session files
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("tab") {
        return Some("YAML indentation must use spaces, not tabs.".to_string());
    }

    if msg.contains("duplicate") {
        return Some("Each key may appear only once per part.".to_string());
    }

    if msg.contains("missing field `name`") || msg.contains("missing field `volume`") {
        return Some("Every part needs at least a `name` and a `volume`.".to_string());
    }

    if msg.contains("quantity") && msg.contains("invalid") {
        return Some("`quantity` is a whole number of parts, 1 or more.".to_string());
    }

    if msg.contains("unknown variant") && msg.contains("imperial") {
        return Some("`units` is either `imperial` or `metric`.".to_string());
    }

    if msg.contains("mapping values are not allowed") || msg.contains("unexpected ':'") {
        return Some(
            "Names containing ': ' must be quoted, e.g. \"Material: Steel 1018\":".to_string(),
        );
    }

    None
}
