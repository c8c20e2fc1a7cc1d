use bilet_server::{ServerBuilder, load_config, observability};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From BILET_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (bilet.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (BILET_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present; it is optional for local development
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }

    let (config_path, source) = resolve_config_path();

    let config = match load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    observability::init_tracing(&config.logging.level);

    tracing::info!(
        path = %config_path.as_deref().unwrap_or("<defaults>"),
        source = %source,
        "configuration loaded"
    );

    let server = match ServerBuilder::new().with_config(config).build().await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Server initialization failed: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Server error: {e}");
    }
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: BILET_CONFIG
/// 3. Default: bilet.toml, only when the file exists
fn resolve_config_path() -> (Option<String>, ConfigSource) {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (Some(path), ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = std::env::var("BILET_CONFIG") {
        return (Some(path), ConfigSource::EnvironmentVariable);
    }

    if std::path::Path::new("bilet.toml").exists() {
        return (Some("bilet.toml".to_string()), ConfigSource::Default);
    }

    (None, ConfigSource::Default)
}
