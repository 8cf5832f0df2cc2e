use anyhow::{Context, Result};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use tracing::debug;

/// Raised when neither `--instruction` nor positional words supply a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingInstruction;

impl fmt::Display for MissingInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no instruction provided; pass --instruction or trailing prompt words"
        )
    }
}

impl Error for MissingInstruction {}

/// Reads all of stdin unless it is attached to a terminal.
pub fn read_piped_stdin() -> Result<Option<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    debug!("reading piped stdin");
    let mut buf = Vec::new();
    stdin
        .lock()
        .read_to_end(&mut buf)
        .context("Failed to read from stdin")?;
    debug!(bytes = buf.len(), "read piped stdin");
    Ok(Some(decode_text(buf)))
}

pub fn read_input_file(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading input file");
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read input file '{}'", path.display()))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read input file");
    Ok(decode_text(bytes))
}

/// Invalid UTF-8 sequences become U+FFFD instead of failing the run.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!("input is not valid UTF-8, replacing invalid sequences");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

/// Joins piped text and file content. When both are present the piped text
/// is trimmed and goes first, followed by a newline and the raw file content.
pub fn merge_input(piped: Option<&str>, file: Option<&str>) -> String {
    let piped = piped.filter(|text| !text.is_empty());
    match (piped, file) {
        (Some(piped), Some(file)) => {
            debug!("combining piped stdin with input file");
            format!("{}\n{}", piped.trim(), file)
        }
        (Some(piped), None) => piped.to_string(),
        (None, Some(file)) => file.to_string(),
        (None, None) => String::new(),
    }
}

/// The explicit instruction wins; otherwise the positional words are joined
/// with single spaces.
pub fn resolve_prompt(
    instruction: Option<&str>,
    positional: &[String],
) -> Result<String, MissingInstruction> {
    if let Some(instruction) = instruction.filter(|text| !text.is_empty()) {
        return Ok(instruction.to_string());
    }

    let joined = positional.join(" ");
    if joined.is_empty() {
        return Err(MissingInstruction);
    }
    Ok(joined)
}
