use crate::config::{HostLayout, RuntimeTuning};
use std::fs;
use std::io;
use std::path::Path;

/// Key/value pairs read by docker compose at container start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFile {
    entries: Vec<(&'static str, String)>,
}

impl EnvironmentFile {
    pub fn new(layout: &HostLayout, runtime: &RuntimeTuning) -> Self {
        Self {
            entries: vec![
                ("NETWORK_LABEL", layout.network_label.to_string()),
                ("HOST_DATA_DIR", layout.data_root.display().to_string()),
                ("HOST_APP_DIR", layout.app_root.display().to_string()),
                ("ERL_FLAGS", runtime.erl_flags.clone()),
                ("LOG_FILE_PATH", runtime.log_file_path.clone()),
            ],
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("# Generated by ae-mdw-installer, overwritten on every run\n");
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(&quote(value));
            out.push('\n');
        }
        out
    }

    /// Replace whatever is at `path`
    pub fn write(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())?;
        log::info!("Environment file written: {}", path.display());
        Ok(())
    }
}

fn quote(value: &str) -> String {
    if value.chars().any(|c| c.is_whitespace() || c == '#' || c == '"') {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
