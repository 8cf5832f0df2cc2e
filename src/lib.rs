pub mod cli;
pub mod config;
pub mod input;
pub mod logging;
pub mod providers;
pub mod request;
pub mod response;

use anyhow::{Context, Result};
use clap::CommandFactory;
use reqwest::Client;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use cli::{Cli, RuntimeOptions};
use config::{Config, EnvFileStatus};
use providers::CompletionTransport;
use providers::deepseek::DeepSeekClient;
use request::CompletionRequest;

/// Runs one prompt end to end: options, configuration, input, request,
/// transport, output. Every error is terminal for the process.
pub async fn run(cli: Cli) -> Result<()> {
    let options = cli.into_options()?;
    logging::init(options.verbose);
    debug!(
        temperature = options.sampling.temperature,
        max_tokens = options.sampling.max_tokens,
        raw_output = options.raw_output,
        "validated runtime options"
    );

    match config::load_env_file(Path::new(config::ENV_FILE)) {
        EnvFileStatus::Loaded => debug!(path = config::ENV_FILE, "loaded environment file"),
        EnvFileStatus::Missing => debug!(
            path = config::ENV_FILE,
            "environment file not found, using process environment"
        ),
        EnvFileStatus::Failed(reason) => warn!(
            path = config::ENV_FILE,
            error = %reason,
            "failed to load environment file"
        ),
    }
    let cfg = Config::from_env()?;
    info!(
        api_url = %cfg.api_url,
        request_timeout_secs = cfg.request_timeout_secs,
        "loaded runtime configuration"
    );

    let request = prepare_request(&options)?;

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .build()
        .context("Failed to initialize HTTP client")?;
    let transport = DeepSeekClient::new(&client, &cfg);

    let mut stdout = io::stdout().lock();
    dispatch(&transport, &request, &options, &mut stdout).await
}

fn prepare_request(options: &RuntimeOptions) -> Result<CompletionRequest> {
    let piped = input::read_piped_stdin()?;
    let file = options
        .input_file
        .as_deref()
        .map(input::read_input_file)
        .transpose()?;
    let input = input::merge_input(piped.as_deref(), file.as_deref());

    let prompt = input::resolve_prompt(options.instruction.as_deref(), &options.prompt_words)
        .inspect_err(|_| eprintln!("{}", Cli::command().render_help()))?;
    debug!(prompt = %prompt, input_bytes = input.len(), "assembled input");

    let request = CompletionRequest::build(&input, &prompt, options.sampling)?;
    debug!(message_count = request.messages.len(), "built chat completion request");
    Ok(request)
}

/// Sends `request` once and routes the response body to `out` or the
/// configured output file.
pub async fn dispatch<T, W>(
    transport: &T,
    request: &CompletionRequest,
    options: &RuntimeOptions,
    out: &mut W,
) -> Result<()>
where
    T: CompletionTransport + ?Sized,
    W: Write,
{
    let response = transport.send(request).await?;
    debug!(status = response.status, "response received");
    response::handle_response(&response.body, options.raw_output, &options.output, out)
}
