use std::collections::HashMap;
use std::path::{Path, PathBuf};

use newsreel_nntp::NewsServer;

use crate::error::ConfigError;
use crate::parse::{extract_servers, parse_config};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub servers: Vec<NewsServer>,
}

impl Config {
    pub fn from_raw(raw: HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(Self {
            servers: extract_servers(&raw)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_raw(parse_config(&content)?)
    }

    /// Server by 1-based id as declared in the file.
    pub fn server(&self, id: u32) -> Option<&NewsServer> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// First existing file among `newsreel/newsreel.conf` under the
    /// platform config directory and `/etc/newsreel.conf`.
    pub fn default_path() -> Option<PathBuf> {
        let candidates = [
            dirs::config_dir().map(|d| d.join("newsreel").join("newsreel.conf")),
            Some(PathBuf::from("/etc/newsreel.conf")),
        ];
        candidates.into_iter().flatten().find(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_config_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(tmp, "Server1.Host=news.example.com").expect("write");
        writeln!(tmp, "Server1.Port=8119").expect("write");
        writeln!(tmp, "Server2.Host=backup.example.com").expect("write");

        let config = Config::load(tmp.path()).expect("load");
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.server(1).unwrap().port, 8119);
        assert_eq!(config.server(2).unwrap().host, "backup.example.com");
        assert!(config.server(3).is_none());
    }

    #[test]
    fn load_config_returns_error_for_missing_file() {
        let result = Config::load(Path::new("/nonexistent/newsreel.conf"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
