use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub server: ServerConfig,
  /// Custom title for dashboard output (defaults to the server host).
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Base URL of the fee-management API, e.g. `https://fees.example.com/api`.
  pub url: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./feesctl.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/feesctl/config.yaml
  /// 4. ~/.config/feesctl/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/feesctl/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("feesctl.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("feesctl").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the admin password from environment variables.
  ///
  /// Checks FEESCTL_PASSWORD first, then FEES_ADMIN_PASSWORD as fallback.
  pub fn get_password() -> Result<String> {
    std::env::var("FEESCTL_PASSWORD")
      .or_else(|_| std::env::var("FEES_ADMIN_PASSWORD"))
      .map_err(|_| {
        eyre!("Admin password not found. Set FEESCTL_PASSWORD or FEES_ADMIN_PASSWORD environment variable.")
      })
  }

  /// Title to print on the dashboard header.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    url::Url::parse(&self.server.url)
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| self.server.url.clone())
  }
}
