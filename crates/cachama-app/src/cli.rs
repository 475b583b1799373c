//! CLI argument definitions for the Cachama application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cachama - a menu-aware chat assistant that streams replies from a hosted
/// language model.
#[derive(Parser, Debug)]
#[command(name = "cachama", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding the catalog database.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the chat page and API (default).
    Serve(ServeArgs),
    /// Load menu records from a JSON array into the catalog.
    Seed {
        /// JSON file with `[{id, name, category, description, price}, ...]`.
        file: PathBuf,
    },
    /// Ask a running server a question and stream the answer.
    Ask {
        /// The message to send.
        message: String,

        /// Base URL of the server.
        #[arg(short = 's', long = "server", default_value = "http://127.0.0.1:8787")]
        server: String,

        /// Write the final rendered markup to this file.
        #[arg(long = "html")]
        html: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CACHAMA_CONFIG env var > ~/.cachama/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CACHAMA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory. `None` keeps the config value.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level. `None` keeps the config value.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

impl ServeArgs {
    /// Resolve the API server port.
    ///
    /// Priority: --port flag > CACHAMA_PORT env var > config file value > 8787.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("CACHAMA_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        8787
    }
}

/// Bearer token for the model runner: CACHAMA_AI_TOKEN overrides the config.
pub fn resolve_ai_token(config_token: Option<String>) -> Option<String> {
    std::env::var("CACHAMA_AI_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .or(config_token)
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cachama").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let args = CliArgs::try_parse_from(["cachama"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_serve_port_flag_wins() {
        let args = CliArgs::try_parse_from(["cachama", "serve", "--port", "9100"]).unwrap();
        match args.command {
            Some(Command::Serve(serve)) => assert_eq!(serve.resolve_port(8787), 9100),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["cachama", "seed", "menu.json", "--config", "/etc/c.toml"])
                .unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/c.toml"));
        match args.command {
            Some(Command::Seed { file }) => assert_eq!(file, PathBuf::from("menu.json")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ask_arguments() {
        let args = CliArgs::try_parse_from([
            "cachama",
            "ask",
            "¿Cuánto cuesta la cachama?",
            "--html",
            "out.html",
        ])
        .unwrap();
        match args.command {
            Some(Command::Ask {
                message,
                server,
                html,
            }) => {
                assert_eq!(message, "¿Cuánto cuesta la cachama?");
                assert_eq!(server, "http://127.0.0.1:8787");
                assert_eq!(html, Some(PathBuf::from("out.html")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/srv/cachama"), PathBuf::from("/srv/cachama"));
        assert_eq!(expand_home("data"), PathBuf::from("data"));
    }
}
