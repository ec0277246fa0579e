// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use figment::Figment;
use figment::providers::{Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the TCP listener binds.
    pub listen_address: String,
    pub listen_port: u16,
    /// Directory holding one store directory per database, plus `core`.
    pub data_dir: PathBuf,
    /// Database sessions start in before an explicit change.
    pub default_database: String,
    /// Flusher worker threads. Clamped to at least one.
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            listen_port: 6378,
            data_dir: PathBuf::from("beryl-data"),
            default_database: "default".to_string(),
            workers: 4,
        }
    }
}

impl ServerConfig {
    /// Defaults, overlaid by the YAML config file when one is given.
    pub fn load(config_file: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(ServerConfig::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Yaml::file(path));
        }
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.listen_port, 6378);
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("beryl.yaml");
        std::fs::write(&path, "listen_port: 7000\ndefault_database: main\n").unwrap();
        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.listen_port, 7000);
        assert_eq!(config.default_database, "main");
        assert_eq!(config.workers, 4);
    }
}
