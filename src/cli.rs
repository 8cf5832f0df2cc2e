use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::request::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, SamplingOptions};
use crate::response::OutputTarget;

const AFTER_HELP: &str = "\
Examples:
  Direct query:
    $ deepcli -i \"How do I reverse an array in Python?\"

  File analysis:
    $ deepcli -i \"Explain this code\" -f program.js

  Unix pipeline:
    $ git diff | deepcli -i \"Explain the changes\"

  Save the answer to a file:
    $ deepcli -i \"Find bugs\" -f code.py -o bugs.txt

  Strict refactoring with a longer answer:
    $ deepcli -i \"Refactor this code\" -t 0.3 -m 4096 -f legacy.rs

  Raw JSON for further processing:
    $ deepcli --raw \"Say hi\" | jq -r '.choices[0].message.content'

Configuration:
  The API key is read from DEEPSEEK_API_KEY, either exported in the shell
  or stored in a .env file in the current directory:
    $ echo 'DEEPSEEK_API_KEY=your_key' > .env

  DEEPSEEK_API_URL overrides the endpoint and DEEPSEEK_TIMEOUT_SECS the
  request timeout. RUST_LOG and LOG_FORMAT (pretty or json) tune
  diagnostics, which are always written to stderr.";

#[derive(Debug, Parser)]
#[command(
    name = "deepcli",
    version,
    about = "Terminal assistant for code analysis and technical questions, backed by DeepSeek Chat",
    after_long_help = AFTER_HELP
)]
pub struct Cli {
    /// Question or instruction for the model
    #[arg(short, long)]
    pub instruction: Option<String>,

    /// File whose content is sent as context
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Write the answer to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Sampling temperature: 0.0 precise, 0.7 balanced, 1.5+ creative
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Maximum number of tokens in the answer
    #[arg(
        short = 'm',
        long = "maxtokens",
        default_value_t = i64::from(DEFAULT_MAX_TOKENS),
        allow_negative_numbers = true
    )]
    pub max_tokens: i64,

    /// Print the raw JSON response without decoding it
    #[arg(long)]
    pub raw: bool,

    /// Log request and response details to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Instruction words, used when --instruction is not given
    #[arg(value_name = "PROMPT", trailing_var_arg = true)]
    pub prompt: Vec<String>,
}

/// Everything the pipeline needs from the command line, validated once.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeOptions {
    pub instruction: Option<String>,
    pub prompt_words: Vec<String>,
    pub input_file: Option<PathBuf>,
    pub output: OutputTarget,
    pub sampling: SamplingOptions,
    pub raw_output: bool,
    pub verbose: bool,
}

impl Cli {
    pub fn into_options(self) -> Result<RuntimeOptions> {
        let sampling = SamplingOptions::new(self.temperature, self.max_tokens)?;
        let output = match self.output {
            Some(path) => OutputTarget::File(path),
            None => OutputTarget::Stdout,
        };

        Ok(RuntimeOptions {
            instruction: self.instruction,
            prompt_words: self.prompt,
            input_file: self.file,
            output,
            sampling,
            raw_output: self.raw,
            verbose: self.verbose,
        })
    }
}
