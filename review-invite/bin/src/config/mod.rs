mod error;
mod smtp;

use std::path::{Path, PathBuf};

use resolve_path::PathResolveExt;
use review_invite_cli_common::config::LogConfig;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub use self::{error::Error, smtp::SmtpConfig};
use crate::project::{CONFIG_NAME, PROJECT_CONFIG_DIR};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Config {
    #[inline]
    pub fn default_path() -> PathBuf {
        [PROJECT_CONFIG_DIR.to_path_buf(), PathBuf::from(CONFIG_NAME)].into_iter().collect()
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let data = std::fs::read_to_string(&path)
            .context(error::OpenConfigSnafu { filename: path.as_ref().to_path_buf() })?;

        Self::from_yaml(&data, path.as_ref())
    }

    fn from_yaml(data: &str, path: &Path) -> Result<Self, Error> {
        let mut config: Self = serde_yaml::from_str(data)
            .context(error::ParseConfigSnafu { filename: path.to_path_buf() })?;

        config.log.file_path = match config.log.file_path.map(|path| {
            path.try_resolve()
                .map(|path| path.to_path_buf())
                .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
        }) {
            Some(Ok(path)) => Some(path),
            Some(Err(err)) => return Err(err),
            None => None,
        };

        Ok(config)
    }
}
