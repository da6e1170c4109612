use crate::cli::display::print_download_summary;
use crate::cli::error::InstallerError;
use crate::config::{
    default_install_dir, parse_flag, InstallConfig, RawInputs, RuntimeTuning,
};
use crate::network::{Network, Variant};
use crate::probe::{SizeProber, SizeSummary};
use crate::prompt::Prompter;
use crate::sources::{mdw_archive_source, node_archive_source, optional_source};
use colored::Colorize;
use std::path::PathBuf;

/// Resolved configuration plus what the probes found out
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: InstallConfig,
    pub sizes: SizeSummary,
}

fn network_choices() -> Vec<String> {
    Network::ALL
        .iter()
        .map(|n| format!("{n} ({})", n.label()))
        .collect()
}

/// Merge inputs and prompts into one immutable configuration
pub async fn resolve(
    inputs: RawInputs,
    start_after: bool,
    prompter: &dyn Prompter,
    prober: &SizeProber,
) -> Result<Resolution, InstallerError> {
    let supplied_network = inputs
        .network
        .as_deref()
        .map(str::parse::<Network>)
        .transpose()?;
    let variant = inputs
        .variant
        .as_deref()
        .map(str::parse::<Variant>)
        .transpose()?
        .unwrap_or_default();
    let download_node = parse_flag("DOWNLOAD_NODE", inputs.download_node.as_deref())?;
    let download_mdw = parse_flag("DOWNLOAD_MDW", inputs.download_mdw.as_deref())?;

    let default_dir = inputs.install_dir.clone().unwrap_or_else(default_install_dir);
    let install_dir = PathBuf::from(
        prompter.input("Installation directory", &default_dir.display().to_string())?,
    );

    let network = match supplied_network {
        Some(network) => network,
        None => {
            let index = prompter.select("Network", &network_choices(), 0)?;
            Network::ALL.get(index).copied().unwrap_or_default()
        }
    };

    let mut download_node = download_node.unwrap_or(true);
    let mut download_mdw = download_mdw.unwrap_or(variant.indexing_enabled());
    if download_mdw && !variant.indexing_enabled() {
        log::warn!("The middleware snapshot requires the full variant");
        println!(
            "{}",
            "⚠️ The light variant is incompatible with the middleware; downloading its snapshot anyway"
                .yellow()
        );
    }

    let node_archive = node_archive_source(network, variant, inputs.node_url.as_deref());
    let mdw_archive = mdw_archive_source(network, inputs.mdw_url.as_deref());

    let node_probe = download_node.then(|| node_archive.fetch_url()).flatten();
    let mdw_probe = download_mdw.then(|| mdw_archive.fetch_url()).flatten();
    let sizes = if node_probe.is_some() || mdw_probe.is_some() {
        println!("🔍 Checking snapshot sizes...");
        prober
            .summarize(node_probe.as_deref(), mdw_probe.as_deref())
            .await
    } else {
        SizeSummary::default()
    };

    if download_node || download_mdw {
        print_download_summary(
            download_node.then_some(&node_archive),
            download_mdw.then_some(&mdw_archive),
            &sizes,
        );
        if !prompter.confirm("Download the snapshots listed above?", true)? {
            println!("⏭️ Skipping downloads; existing or local archives will still be used");
            download_node = false;
            download_mdw = false;
        }
    }

    let config = InstallConfig {
        network,
        variant,
        install_dir,
        download_node,
        download_mdw,
        node_archive,
        mdw_archive,
        manifest_source: optional_source(inputs.compose_url.as_deref()),
        config_source: optional_source(inputs.config_url.as_deref()),
        template_dir: inputs.template_dir,
        runtime: RuntimeTuning {
            erl_flags: inputs
                .erl_flags
                .unwrap_or_else(|| RuntimeTuning::default().erl_flags),
            log_file_path: inputs
                .log_file_path
                .unwrap_or_else(|| RuntimeTuning::default().log_file_path),
        },
        start_after,
        non_interactive: !prompter.is_interactive(),
    };

    Ok(Resolution { config, sizes })
}
