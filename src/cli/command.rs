use crate::config::RawInputs;
use clap::Parser;
use std::path::PathBuf;

const ENV_HELP: &str = "\
Environment variables:
  NETWORK            mainnet | uat | testnet
  VARIANT            full | light
  DOWNLOAD_NODE      download the node snapshot (true/false)
  DOWNLOAD_MDW       download the middleware snapshot (true/false)
  INSTALL_DIR        installation directory
  NODE_URL           node snapshot URL or local archive path
  MDW_URL            middleware snapshot URL or local archive path
  COMPOSE_URL        docker-compose.yml URL or path
  CONFIG_URL         aeternity.yaml URL or path
  TEMPLATE_DIR       directory holding the packaged templates
  ERL_FLAGS          passed to the containers (default: +A 64 +K true)
  LOG_FILE_PATH      passed to the containers";

#[derive(Parser, Debug)]
#[command(
    name = "ae-mdw-installer",
    about = "Installs an aeternity node and middleware under docker compose",
    version,
    after_help = ENV_HELP
)]
pub struct Cli {
    /// Run without prompts, using flags, environment and defaults
    #[arg(short = 'y', long)]
    pub non_interactive: bool,

    /// Do not pull and start the containers afterwards
    #[arg(long)]
    pub no_start: bool,

    /// Resolve and display everything without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Network (mainnet, uat/testnet)
    #[arg(long)]
    pub network: Option<String>,

    /// Storage variant (full, light)
    #[arg(long)]
    pub variant: Option<String>,

    /// Installation directory
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Values given directly on the command line
    pub fn inputs(&self) -> RawInputs {
        RawInputs {
            network: self.network.clone(),
            variant: self.variant.clone(),
            install_dir: self.install_dir.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_switches() {
        let cli = Cli::try_parse_from([
            "ae-mdw-installer",
            "-y",
            "--no-start",
            "--dry-run",
            "--network",
            "testnet",
            "--install-dir",
            "/opt/ae",
        ])
        .unwrap();

        assert!(cli.non_interactive);
        assert!(cli.no_start);
        assert!(cli.dry_run);
        let inputs = cli.inputs();
        assert_eq!(inputs.network.as_deref(), Some("testnet"));
        assert_eq!(inputs.install_dir, Some(PathBuf::from("/opt/ae")));
        assert_eq!(inputs.variant, None);
    }

    #[test]
    fn defaults_are_interactive_with_start() {
        let cli = Cli::try_parse_from(["ae-mdw-installer"]).unwrap();
        assert!(!cli.non_interactive);
        assert!(!cli.no_start);
        assert!(!cli.dry_run);
        assert_eq!(cli.inputs(), RawInputs::default());
    }
}
