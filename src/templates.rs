//! Templates for the compose manifest and the node config
//!
//! Copies are compiled into the binary. A template directory given through
//! `TEMPLATE_DIR` replaces them.

use std::fmt;
use std::path::{Path, PathBuf};

pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
pub const NODE_CONFIG_FILE_NAME: &str = "aeternity.yaml";

const PACKAGED_COMPOSE: &str = include_str!("../templates/docker-compose.yml");
const PACKAGED_NODE_CONFIG: &str = include_str!("../templates/aeternity.yaml");

/// Where the fallback content of a managed file comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// A file in an operator-supplied template directory
    File(PathBuf),
    /// Built into the installer
    Packaged {
        name: &'static str,
        content: &'static str,
    },
}

impl Template {
    fn resolve(dir: Option<&Path>, name: &'static str, content: &'static str) -> Self {
        match dir {
            Some(dir) => Template::File(dir.join(name)),
            None => Template::Packaged { name, content },
        }
    }

    pub fn compose(dir: Option<&Path>) -> Self {
        Self::resolve(dir, COMPOSE_FILE_NAME, PACKAGED_COMPOSE)
    }

    pub fn node_config(dir: Option<&Path>) -> Self {
        Self::resolve(dir, NODE_CONFIG_FILE_NAME, PACKAGED_NODE_CONFIG)
    }

    pub fn is_available(&self) -> bool {
        match self {
            Template::File(path) => path.is_file(),
            Template::Packaged { .. } => true,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::File(path) => write!(f, "{}", path.display()),
            Template::Packaged { name, .. } => write!(f, "built-in {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn packaged_templates_carry_patchable_lines() {
        let Template::Packaged { content, .. } = Template::node_config(None) else {
            panic!("expected the packaged node config");
        };
        assert!(content.contains("  network_id: ae_mainnet\n"));
        assert!(content.contains("  indexing_enabled: true\n"));

        let Template::Packaged { content, .. } = Template::compose(None) else {
            panic!("expected the packaged compose file");
        };
        assert!(content.contains("${HOST_DATA_DIR}/mnesia"));
        assert!(content.contains("${HOST_APP_DIR}/aeternity.yaml"));
    }

    #[test]
    fn packaged_templates_are_always_available() {
        assert!(Template::compose(None).is_available());
        assert_eq!(Template::compose(None).to_string(), "built-in docker-compose.yml");
    }

    #[test]
    fn template_dir_replaces_packaged_copies() {
        let temp = tempdir().unwrap();
        let template = Template::compose(Some(temp.path()));
        assert_eq!(template, Template::File(temp.path().join("docker-compose.yml")));
        assert!(!template.is_available());

        std::fs::write(temp.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        assert!(template.is_available());
    }
}
