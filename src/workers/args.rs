//! Command-line argument parsing and configuration.
//!
//! Supports:
//! - CLI arguments via clap
//! - TOML configuration file
//! - Merging CLI with file config (CLI takes precedence)

use crate::core::config::DEFAULT_WS_PORT;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// fsman - terminal client for embedded web file managers and display shells.
#[derive(Parser, Deserialize, Clone, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Device address: host, host:port or full http URL.
    #[clap(default_value = "192.168.4.1")]
    #[serde(default = "default_device")]
    pub device: String,

    /// Port of the device's display WebSocket.
    #[clap(long, default_value_t = DEFAULT_WS_PORT)]
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,

    /// Directory downloaded files are saved into.
    #[clap(long)]
    pub download_dir: Option<PathBuf>,

    /// Path to a config file (TOML).
    #[clap(long)]
    #[serde(default)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv).
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    #[serde(default)]
    pub verbose: u8,
}

fn default_ws_port() -> u16 {
    DEFAULT_WS_PORT
}

impl Args {
    /// Load Args from CLI + TOML file (if it exists).
    /// CLI values override those from the file.
    pub fn load() -> Self {
        let cli_args = Args::parse();

        if let Some(config_path) = cli_args.config.clone() {
            if let Some(file_args) = Self::from_file(&config_path) {
                return Self::merge(file_args, cli_args);
            }
            return cli_args;
        }

        let default_path = PathBuf::from("fsman.toml");
        if let Some(file_args) = Self::from_file(&default_path) {
            return Self::merge(file_args, cli_args);
        }

        cli_args
    }

    /// Load args from a TOML file.
    fn from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let content = fs::read_to_string(path).ok()?;
        toml::from_str::<Args>(&content).ok()
    }

    /// Merge file args with CLI args (CLI takes precedence).
    fn merge(mut file: Args, cli: Args) -> Args {
        if cli.device != default_device() {
            file.device = cli.device;
        }
        if cli.ws_port != DEFAULT_WS_PORT {
            file.ws_port = cli.ws_port;
        }
        if cli.download_dir.is_some() {
            file.download_dir = cli.download_dir;
        }
        if cli.verbose > 0 {
            file.verbose = cli.verbose;
        }
        file.config = cli.config;
        file
    }

    /// HTTP origin of the device, e.g. `http://192.168.4.1`.
    pub fn http_base(&self) -> String {
        let device = self.device.trim_end_matches('/');
        if device.starts_with("http://") || device.starts_with("https://") {
            device.to_string()
        } else {
            format!("http://{device}")
        }
    }

    /// WebSocket URL of the display channel, e.g. `ws://192.168.4.1:81`.
    pub fn ws_url(&self) -> String {
        let base = self.http_base();
        let host = base
            .trim_start_matches("http://")
            .trim_start_matches("https://");
        // The display socket lives on its own port; strip any port the
        // device address carried.
        let host = host.split(':').next().unwrap_or(host);
        format!("ws://{host}:{}", self.ws_port)
    }

    /// Download target directory; defaults to the working directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_device() -> String {
    "192.168.4.1".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(device: &str) -> Args {
        Args {
            device: device.to_string(),
            ws_port: DEFAULT_WS_PORT,
            download_dir: None,
            config: None,
            verbose: 0,
        }
    }

    #[test]
    fn http_base_accepts_bare_host() {
        assert_eq!(args("192.168.4.1").http_base(), "http://192.168.4.1");
        assert_eq!(args("http://dev.local/").http_base(), "http://dev.local");
    }

    #[test]
    fn ws_url_uses_ws_port_not_http_port() {
        assert_eq!(args("192.168.4.1").ws_url(), "ws://192.168.4.1:81");
        assert_eq!(args("http://dev.local:8080").ws_url(), "ws://dev.local:81");
        let mut custom = args("dev.local");
        custom.ws_port = 8081;
        assert_eq!(custom.ws_url(), "ws://dev.local:8081");
    }

    #[test]
    fn merge_cli_overrides_file() {
        let file = args("from-file.local");
        let mut cli = args("from-cli.local");
        cli.verbose = 2;
        let merged = Args::merge(file, cli);
        assert_eq!(merged.device, "from-cli.local");
        assert_eq!(merged.verbose, 2);
    }

    #[test]
    fn merge_keeps_file_values_for_defaults() {
        let mut file = args("from-file.local");
        file.ws_port = 8081;
        let cli = args(&default_device());
        let merged = Args::merge(file, cli);
        assert_eq!(merged.device, "from-file.local");
        assert_eq!(merged.ws_port, 8081);
    }
}
