//! Command-line interface for the morph file conversion service.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use morph::{ConversionRequest, Dispatcher, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "morph", version, about = "Convert files between formats within a media category")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Host address to bind to
        #[arg(short = 'H', long, env = "MORPH_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "MORPH_PORT", default_value_t = 8000)]
        port: u16,

        /// Path to a morph.toml config file (discovered if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Start the MCP server on stdio
    Mcp {
        /// Path to a morph.toml config file (discovered if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Convert a local file; formats are taken from the file extensions
    Convert {
        /// Input file path
        input: PathBuf,

        /// Output file path
        output: PathBuf,

        /// Override the input format instead of using the extension
        #[arg(long)]
        from: Option<String>,

        /// Override the output format instead of using the extension
        #[arg(long)]
        to: Option<String>,
    },

    /// List supported formats grouped by media category
    Formats,
}

fn init_tracing(stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if stderr {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServiceConfig> {
    match path {
        Some(path) => ServiceConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(match ServiceConfig::discover()? {
            Some(config) => config,
            None => ServiceConfig::default(),
        }),
    }
}

fn format_token(explicit: Option<String>, path: &Path, flag: &str) -> anyhow::Result<String> {
    if let Some(token) = explicit {
        return Ok(token);
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => Ok(ext.to_string()),
        _ => bail!(
            "cannot derive a format from '{}'; pass --{} explicitly",
            path.display(),
            flag
        ),
    }
}

async fn run_convert(
    input: PathBuf,
    output: PathBuf,
    from: Option<String>,
    to: Option<String>,
) -> anyhow::Result<()> {
    let input_format = format_token(from, &input, "from")?;
    let output_format = format_token(to, &output, "to")?;

    let config = load_config(None)?;
    let dispatcher = Dispatcher::new(config);

    let payload = tokio::fs::read(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;

    let request = ConversionRequest::new(payload, &input_format, &output_format);
    let conversion = dispatcher.convert(request).await?;

    tokio::fs::write(&output, &conversion.bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        "Converted {} ({}) -> {} ({}, {} bytes)",
        input.display(),
        input_format,
        output.display(),
        conversion.output_format,
        conversion.bytes.len()
    );

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdio MCP transport owns stdout; logs must not corrupt the stream
    init_tracing(matches!(cli.command, Commands::Mcp { .. }));

    match cli.command {
        Commands::Serve { host, port, config } => {
            let config = load_config(config.as_deref())?;
            morph::api::serve_with_config(&host, port, config).await?;
        }
        Commands::Mcp { config } => match config {
            Some(path) => {
                let config = load_config(Some(&path))?;
                morph::mcp::start_mcp_server_with_config(config)
                    .await
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            None => {
                morph::mcp::start_mcp_server().await.map_err(|e| anyhow::anyhow!(e))?;
            }
        },
        Commands::Convert { input, output, from, to } => {
            run_convert(input, output, from, to).await?;
        }
        Commands::Formats => {
            let formats = morph::list_formats();
            println!("{}", serde_json::to_string_pretty(&formats)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_defaults() {
        let cli = Cli::try_parse_from(["morph", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { host, port, config } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8000);
                assert!(config.is_none());
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_cli_parses_convert_overrides() {
        let cli = Cli::try_parse_from(["morph", "convert", "in.bin", "out.bin", "--from", "png", "--to", "jpg"])
            .unwrap();
        match cli.command {
            Commands::Convert { from, to, .. } => {
                assert_eq!(from.as_deref(), Some("png"));
                assert_eq!(to.as_deref(), Some("jpg"));
            }
            _ => panic!("expected convert command"),
        }
    }

    #[test]
    fn test_format_token_prefers_explicit_over_extension() {
        let token = format_token(Some("webp".to_string()), Path::new("photo.png"), "from").unwrap();
        assert_eq!(token, "webp");
    }

    #[test]
    fn test_format_token_from_extension() {
        let token = format_token(None, Path::new("song.mp3"), "from").unwrap();
        assert_eq!(token, "mp3");
    }

    #[test]
    fn test_format_token_missing_extension_errors() {
        let err = format_token(None, Path::new("noextension"), "to").unwrap_err();
        assert!(err.to_string().contains("--to"));
    }
}
