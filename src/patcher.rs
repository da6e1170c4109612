//! Exact-line configuration patching
//!
//! A patch is a list of rules, each matching a whole line that holds a known
//! key with one specific value and rewriting only that value. Lines already
//! in the target state never match, so applying the same rules twice changes
//! nothing the second time.

use crate::network::{Network, Variant};
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;

/// Rewrites `key: from` lines into `key: to`, keeping indentation, quoting and line endings
#[derive(Debug, Clone)]
pub struct LineRule {
    pattern: Regex,
    replacement: String,
}

impl LineRule {
    pub fn new(key: &str, from: &str, to: &str) -> Self {
        let pattern = format!(
            r#"(?m)^([ \t]*{}:[ \t]*)(["']?){}(["']?)[ \t]*(\r?)$"#,
            regex::escape(key),
            regex::escape(from)
        );
        Self {
            // Both parts are escaped, the pattern is always valid
            pattern: Regex::new(&pattern).expect("line rule pattern"),
            replacement: format!("${{1}}${{2}}{}${{3}}${{4}}", to.replace('$', "$$")),
        }
    }

    /// Apply to a whole document, returning the new text and the number of rewritten lines
    pub fn apply(&self, text: &str) -> (String, usize) {
        let count = self.pattern.find_iter(text).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        (
            self.pattern
                .replace_all(text, self.replacement.as_str())
                .into_owned(),
            count,
        )
    }
}

/// An ordered set of rules applied to one document
#[derive(Debug, Clone, Default)]
pub struct Patch {
    rules: Vec<LineRule>,
}

impl Patch {
    /// Rules converging the node config onto `network` and `variant`
    pub fn for_node_config(network: Network, variant: Variant) -> Self {
        let target_id = network.network_id();
        let mut rules: Vec<LineRule> = Network::ALL
            .iter()
            .filter(|other| **other != network)
            .map(|other| LineRule::new("network_id", other.network_id(), target_id))
            .collect();

        let (from, to) = if variant.indexing_enabled() {
            ("false", "true")
        } else {
            ("true", "false")
        };
        rules.push(LineRule::new("indexing_enabled", from, to));

        Self { rules }
    }

    pub fn apply(&self, text: &str) -> (String, usize) {
        self.rules
            .iter()
            .fold((text.to_string(), 0), |(current, total), rule| {
                let (next, changed) = rule.apply(&current);
                (next, total + changed)
            })
    }
}

/// Patch the node config file in place. Returns the number of rewritten lines.
pub fn patch_config(path: &Path, network: Network, variant: Variant) -> io::Result<usize> {
    let original = fs::read_to_string(path)?;
    let (patched, changed) = Patch::for_node_config(network, variant).apply(&original);

    if changed > 0 {
        fs::write(path, patched)?;
        log::info!("Patched {changed} line(s) in {}", path.display());
    } else {
        log::info!("{} already matches {network}/{variant}", path.display());
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
---
chain:
  persist: true
  db_path: ./data/mnesia
  indexing_enabled: true
fork_management:
  network_id: ae_mainnet
mining:
  autostart: false
";

    #[test]
    fn rule_keeps_indent_and_quotes() {
        let rule = LineRule::new("network_id", "ae_mainnet", "ae_uat");
        let (out, n) = rule.apply("a:\n    network_id: \"ae_mainnet\"\n");
        assert_eq!(n, 1);
        assert_eq!(out, "a:\n    network_id: \"ae_uat\"\n");
    }

    #[test]
    fn rule_keeps_crlf() {
        let rule = LineRule::new("indexing_enabled", "true", "false");
        let (out, n) = rule.apply("x: 1\r\n  indexing_enabled: true\r\ny: 2\r\n");
        assert_eq!(n, 1);
        assert_eq!(out, "x: 1\r\n  indexing_enabled: false\r\ny: 2\r\n");
    }

    #[test]
    fn rule_ignores_lines_with_extra_content() {
        let rule = LineRule::new("indexing_enabled", "true", "false");
        let text = "  indexing_enabled: true # keep\n  other_indexing_enabled: true\n";
        assert_eq!(rule.apply(text), (text.to_string(), 0));
    }

    #[test]
    fn uat_light_flips_both_lines() {
        let (out, n) = Patch::for_node_config(Network::Uat, Variant::Light).apply(SAMPLE);
        assert_eq!(n, 2);
        assert!(out.contains("  network_id: ae_uat\n"));
        assert!(out.contains("  indexing_enabled: false\n"));
        assert!(out.contains("  persist: true\n"));
        assert!(out.contains("  autostart: false\n"));
    }

    #[test]
    fn mainnet_full_converges_from_either_start() {
        let start = SAMPLE
            .replace("ae_mainnet", "ae_uat")
            .replace("indexing_enabled: true", "indexing_enabled: false");
        let (out, n) = Patch::for_node_config(Network::Mainnet, Variant::Full).apply(&start);
        assert_eq!(n, 2);
        assert_eq!(out, SAMPLE);

        let (out, n) = Patch::for_node_config(Network::Mainnet, Variant::Full).apply(SAMPLE);
        assert_eq!(n, 0);
        assert_eq!(out, SAMPLE);
    }

    #[test]
    fn patching_twice_is_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aeternity.yaml");
        fs::write(&path, SAMPLE).unwrap();

        assert_eq!(patch_config(&path, Network::Uat, Variant::Light).unwrap(), 2);
        let first = fs::read(&path).unwrap();
        assert_eq!(patch_config(&path, Network::Uat, Variant::Light).unwrap(), 0);
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(patch_config(&dir.path().join("nope.yaml"), Network::Mainnet, Variant::Full).is_err());
    }
}
