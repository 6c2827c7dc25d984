//! Server configuration, loaded from TOML.
//!
//! ```toml
//! bind_address = "127.0.0.1:8080"
//! index_file   = "public/index.html"
//! ```
//!
//! Every key is optional. Without `index_file`, unmatched requests get a 404.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Listen address (e.g. `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// File served with `200 OK` when no route matches.
    pub index_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            index_file: None,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn overrides_individual_keys() {
        let cfg = Config::from_toml(r#"bind_address = "127.0.0.1:8080""#).unwrap();
        assert_eq!(cfg.bind_address, "127.0.0.1:8080");
        assert_eq!(cfg.index_file, None);

        let cfg = Config::from_toml(r#"index_file = "site/app.html""#).unwrap();
        assert_eq!(cfg.index_file, Some(PathBuf::from("site/app.html")));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(matches!(Config::from_toml("bind_address = 3000"), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(Config::load("/definitely/not/here.toml"), Err(Error::Io(_))));
    }
}
