use std::{path::PathBuf, sync::LazyLock};

use directories::ProjectDirs;

pub const PROJECT_NAME: &str = "review-invite";

pub const PROGRAM_NAME: &str = "review-invite";
pub const CONFIG_NAME: &str = "review-invite.yaml";

pub static PROJECT_CONFIG_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    ProjectDirs::from("", PROJECT_NAME, PROJECT_NAME)
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.config_dir().to_path_buf())
});
