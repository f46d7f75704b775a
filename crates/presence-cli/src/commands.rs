//! Command handlers for the presence logger console

use std::fs::File;
use std::io::{self, BufReader, Write};

use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::CliAppConfig;
use crate::decode::{decode_transcript, write_messages};
use crate::error::{CliError, Result};
use crate::runner::{self, RunOptions};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, mut config: CliAppConfig) -> Result<()> {
        if let Some(log_path) = &cli.log_path {
            config.console.log_path = log_path.into();
        }

        match cli.command {
            Commands::Run {
                connected,
                duration_ms,
                no_scan,
            } => {
                let options = RunOptions {
                    connected,
                    duration_ms,
                    scanning: !no_scan,
                };
                Self::handle_run_command(config, options).await
            }
            Commands::Decode { file, json } => Self::handle_decode_command(&file, json),
            Commands::Config => Self::handle_config_command(&config),
        }
    }

    async fn handle_run_command(config: CliAppConfig, options: RunOptions) -> Result<()> {
        config.validate()?;
        info!(
            "Starting presence logger (connected: {}, scanning: {})",
            options.connected, options.scanning
        );
        runner::run(config, options).await
    }

    fn handle_decode_command(file: &str, json: bool) -> Result<()> {
        let transcript = File::open(file)
            .map_err(|e| CliError::Transcript(format!("Failed to open {}: {}", file, e)))?;
        let messages = decode_transcript(BufReader::new(transcript))?;
        info!("Decoded {} messages from {}", messages.len(), file);

        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_messages(&mut out, &messages, json)?;
        out.flush()?;
        Ok(())
    }

    fn handle_config_command(config: &CliAppConfig) -> Result<()> {
        print!("{}", config.to_toml()?);
        Ok(())
    }
}
