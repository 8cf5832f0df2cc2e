use anyhow::{Context, Result};
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CompletionResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// What a decoded response means, decided once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Success(String),
    ApiError(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    Api(String),
    NoValidResponse,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(message) => write!(f, "API error: {message}"),
            Self::NoValidResponse => write!(f, "no valid response received from the API"),
        }
    }
}

impl Error for ResponseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// The error message wins over any choices present in the same body.
pub fn parse_completion(body: &[u8]) -> Result<CompletionOutcome> {
    let parsed: CompletionResponseBody =
        serde_json::from_slice(body).context("Failed to parse API response JSON")?;

    if let Some(message) = parsed
        .error
        .and_then(|error| error.message)
        .filter(|message| !message.is_empty())
    {
        return Ok(CompletionOutcome::ApiError(message));
    }

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| CompletionOutcome::Success(choice.message.content.unwrap_or_default()))
        .unwrap_or(CompletionOutcome::Empty))
}

/// Routes a response body to `out` or to the output file. With `raw` set the
/// bytes are copied verbatim and never decoded.
pub fn handle_response<W: Write>(
    body: &[u8],
    raw: bool,
    target: &OutputTarget,
    out: &mut W,
) -> Result<()> {
    if raw {
        out.write_all(body).context("Failed to write raw response")?;
        out.flush().context("Failed to flush stdout")?;
        return Ok(());
    }

    let output = match parse_completion(body)? {
        CompletionOutcome::Success(output) => output,
        CompletionOutcome::ApiError(message) => return Err(ResponseError::Api(message).into()),
        CompletionOutcome::Empty => return Err(ResponseError::NoValidResponse.into()),
    };

    match target {
        OutputTarget::File(path) => {
            write_output_file(path, &output)?;
            writeln!(out, "Response written to {}", path.display())
                .context("Failed to write to stdout")?;
        }
        OutputTarget::Stdout => {
            writeln!(out, "{output}").context("Failed to write to stdout")?;
        }
    }
    out.flush().context("Failed to flush stdout")
}

fn write_output_file(path: &Path, output: &str) -> Result<()> {
    debug!(path = %path.display(), bytes = output.len(), "writing response to file");

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to open output file '{}'", path.display()))?;
    file.write_all(output.as_bytes())
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}
