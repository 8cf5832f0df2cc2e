use std::env;
use tracing_subscriber::EnvFilter;

const QUIET_LOG_FILTER: &str = "warn";
const VERBOSE_LOG_FILTER: &str = "warn,deepcli=debug";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

/// How diagnostics are rendered. They always go to stderr so that stdout
/// carries nothing but the answer.
#[derive(Clone, Debug, PartialEq, Eq)]
struct LogSettings {
    format: LogFormat,
    directive: String,
}

impl LogSettings {
    fn from_env_with(verbose: bool, mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let format = match get_var("LOG_FORMAT")
            .map(|raw| raw.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let directive = get_var("RUST_LOG")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| default_directive(verbose).to_string());

        Self { format, directive }
    }

    fn env_filter(&self, verbose: bool) -> EnvFilter {
        EnvFilter::try_new(&self.directive).unwrap_or_else(|err| {
            eprintln!(
                "deepcli: ignoring invalid RUST_LOG '{}': {}",
                self.directive, err
            );
            EnvFilter::new(default_directive(verbose))
        })
    }
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_FILTER
    } else {
        QUIET_LOG_FILTER
    }
}

/// Installs the global subscriber. `verbose` lowers the default filter to
/// debug for this crate, which includes request and response bodies.
pub fn init(verbose: bool) {
    let settings = LogSettings::from_env_with(verbose, |key| env::var(key).ok());
    let filter = settings.env_filter(verbose);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = match settings.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
