use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn database_file_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join("tubeshuffle").join("tubeshuffle.db"))
}

#[cfg(unix)]
pub fn mpv_socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("tubeshuffle-mpv-{}.sock", std::process::id()))
}
