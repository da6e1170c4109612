use crate::cli::command::Cli;
use crate::cli::display::{display_progress, print_parameters, print_plan};
use crate::cli::error::InstallerError;
use crate::cli::resolve::resolve;
use crate::config::{HostLayout, InstallConfig, RawInputs};
use crate::downloader::http_client;
use crate::env_file::EnvironmentFile;
use crate::error::{ArtifactError, DependencyError};
use crate::extractor::extract;
use crate::materializer::{Materialized, Materializer};
use crate::orchestrator::ComposeCommand;
use crate::patcher::patch_config;
use crate::probe::{format_size, SizeProber};
use crate::process::{ProcessRunner, SystemRunner};
use crate::prompt::{InteractivePrompter, NonInteractivePrompter, Prompter};
use crate::sources::ArtifactSource;
use crate::templates::Template;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Installed,
    DryRun,
    Aborted,
}

/// What happens to one snapshot archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchivePlan {
    /// Fetch into `archive` unless already there, then extract
    Download {
        source: ArtifactSource,
        archive: PathBuf,
    },
    /// Extract an archive that is already on disk
    Extract { archive: PathBuf },
    /// Nothing to download and nothing on disk
    Skip,
}

/// Decide how a snapshot is obtained. Local paths never reach the downloader.
///
/// Remote archives land in `downloads_dir`, which must be distinct per
/// snapshot kind so two URLs ending in the same file name cannot collide.
pub fn plan_archive(
    download: bool,
    source: &ArtifactSource,
    downloads_dir: &Path,
    fallback_name: &str,
) -> ArchivePlan {
    match source {
        ArtifactSource::Local(path) => ArchivePlan::Extract {
            archive: path.clone(),
        },
        ArtifactSource::Remote(_) => {
            let name = source
                .file_name()
                .unwrap_or_else(|| fallback_name.to_string());
            let archive = downloads_dir.join(name);
            if download {
                ArchivePlan::Download {
                    source: source.clone(),
                    archive,
                }
            } else if archive.exists() {
                ArchivePlan::Extract { archive }
            } else {
                ArchivePlan::Skip
            }
        }
    }
}

fn node_plan(config: &InstallConfig, layout: &HostLayout) -> ArchivePlan {
    plan_archive(
        config.download_node,
        &config.node_archive,
        &layout.downloads_dir().join("node"),
        "node-snapshot.tar.zst",
    )
}

fn mdw_plan(config: &InstallConfig, layout: &HostLayout) -> ArchivePlan {
    plan_archive(
        config.download_mdw,
        &config.mdw_archive,
        &layout.downloads_dir().join("mdw"),
        "mdw-snapshot.tar.zst",
    )
}

fn describe_archive(label: &str, plan: &ArchivePlan, dest: &Path) -> Vec<String> {
    match plan {
        ArchivePlan::Download { source, archive } if archive.exists() => vec![
            format!("Reuse {label} snapshot {} (instead of {source})", archive.display()),
            format!("Extract {} into {}", archive.display(), dest.display()),
        ],
        ArchivePlan::Download { source, archive } => vec![
            format!("Download {label} snapshot {source} to {}", archive.display()),
            format!("Extract {} into {}", archive.display(), dest.display()),
        ],
        ArchivePlan::Extract { archive } => {
            vec![format!("Extract {label} snapshot {} into {}", archive.display(), dest.display())]
        }
        ArchivePlan::Skip => vec![format!("Skip {label} snapshot (not downloaded, none on disk)")],
    }
}

fn describe_file(target: &Path, source: Option<&ArtifactSource>, template: &Template) -> String {
    if target.exists() {
        return format!("Keep existing {}", target.display());
    }
    match source {
        Some(ArtifactSource::Remote(url)) => format!("Download {url} to {}", target.display()),
        Some(ArtifactSource::Local(path)) => {
            format!("Copy {} to {}", path.display(), target.display())
        }
        None => format!("Write {template} to {}", target.display()),
    }
}

/// Ordered description of every mutating action
pub fn planned_steps(config: &InstallConfig, compose: ComposeCommand) -> Vec<String> {
    let layout = config.layout();
    let mut steps = vec![format!(
        "Create directories under {}",
        layout.install_dir.display()
    )];
    steps.extend(describe_archive("node", &node_plan(config, &layout), &layout.data_root));
    steps.extend(describe_archive("middleware", &mdw_plan(config, &layout), &layout.data_root));
    steps.push(describe_file(
        &layout.manifest_path(),
        config.manifest_source.as_ref(),
        &config.manifest_template(),
    ));
    steps.push(describe_file(
        &layout.service_config_path(),
        config.config_source.as_ref(),
        &config.config_template(),
    ));
    steps.push(format!(
        "Set network_id: {} and indexing_enabled: {} in {}",
        config.network.network_id(),
        config.variant.indexing_enabled(),
        layout.service_config_path().display()
    ));
    steps.push(format!("Write {}", layout.env_file_path().display()));
    if config.start_after {
        steps.push(format!(
            "Run `{compose} pull` and `{compose} up -d` in {}",
            layout.install_dir.display()
        ));
    } else {
        steps.push(format!(
            "Print the start command: {}",
            compose.manual_start_command(&layout.install_dir)
        ));
    }
    steps
}

async fn install_archive(
    label: &str,
    plan: ArchivePlan,
    dest: &Path,
    materializer: &Materializer<'_>,
    runner: &dyn ProcessRunner,
) -> Result<(), InstallerError> {
    let archive = match plan {
        ArchivePlan::Skip => {
            println!("⏭️ No {label} snapshot to install, skipping");
            return Ok(());
        }
        ArchivePlan::Extract { archive } => archive,
        ArchivePlan::Download { source, archive } => {
            println!("📥 {label} snapshot: {source}");
            let outcome = materializer
                .ensure(&archive, Some(&source), None, |progress| {
                    display_progress(&progress)
                })
                .await?;
            match outcome {
                Materialized::Existing => {
                    println!("💾 {} already downloaded, reusing it", archive.display())
                }
                Materialized::Downloaded { bytes, .. } => {
                    println!();
                    println!("✅ Downloaded {} ({})", archive.display(), format_size(bytes));
                }
                Materialized::Copied { .. } | Materialized::Packaged { .. } => {}
            }
            archive
        }
    };

    println!("📂 Extracting {label} snapshot into {}...", dest.display());
    extract(runner, &archive, dest)?;
    println!("✅ {label} snapshot extracted");
    Ok(())
}

async fn install_file(
    name: &str,
    target: &Path,
    source: Option<&ArtifactSource>,
    template: &Template,
    materializer: &Materializer<'_>,
) -> Result<(), InstallerError> {
    match materializer
        .ensure(target, source, Some(template), |_| {})
        .await?
    {
        Materialized::Existing => println!(
            "✅ {name} already present, left unchanged: {}",
            target.display()
        ),
        Materialized::Downloaded { url, .. } => {
            println!("✅ {name} downloaded from {url}")
        }
        Materialized::Copied { from } => {
            println!("✅ {name} created from {}", from.display())
        }
        Materialized::Packaged { name: template } => {
            println!("✅ {name} created from the built-in {template}")
        }
    }
    Ok(())
}

/// Perform every mutating step in order. Nothing is rolled back on failure.
pub async fn apply(
    config: &InstallConfig,
    runner: &dyn ProcessRunner,
    client: &reqwest::Client,
    compose: ComposeCommand,
) -> Result<(), InstallerError> {
    let layout = config.layout();
    layout.ensure_directories()?;

    let materializer = Materializer::new(client);

    install_archive(
        "node",
        node_plan(config, &layout),
        &layout.data_root,
        &materializer,
        runner,
    )
    .await?;
    install_archive(
        "middleware",
        mdw_plan(config, &layout),
        &layout.data_root,
        &materializer,
        runner,
    )
    .await?;

    install_file(
        "Compose file",
        &layout.manifest_path(),
        config.manifest_source.as_ref(),
        &config.manifest_template(),
        &materializer,
    )
    .await?;
    install_file(
        "Node config",
        &layout.service_config_path(),
        config.config_source.as_ref(),
        &config.config_template(),
        &materializer,
    )
    .await?;

    let changed = patch_config(&layout.service_config_path(), config.network, config.variant)?;
    println!(
        "✅ Node config set to {}/{} ({changed} line(s) changed)",
        config.network, config.variant
    );

    EnvironmentFile::new(&layout, &config.runtime).write(&layout.env_file_path())?;
    println!("✅ Environment written to {}", layout.env_file_path().display());

    if config.start_after {
        println!("{}", "🐳 Pulling images and starting services...".green().bold());
        compose.pull_and_start(runner, &layout.install_dir)?;
        println!("{}", "✅ Services started".green().bold());
    } else {
        println!("Start the services with:");
        println!("   {}", compose.manual_start_command(&layout.install_dir));
    }

    Ok(())
}

/// Fail before any download when a later step is bound to miss its input
fn check_sources(config: &InstallConfig) -> Result<(), ArtifactError> {
    let layout = config.layout();

    for plan in [node_plan(config, &layout), mdw_plan(config, &layout)] {
        if let ArchivePlan::Extract { archive } = plan {
            if !archive.is_file() {
                return Err(ArtifactError::SourceMissing(archive));
            }
        }
    }

    for (target, source, template) in [
        (
            layout.manifest_path(),
            config.manifest_source.as_ref(),
            config.manifest_template(),
        ),
        (
            layout.service_config_path(),
            config.config_source.as_ref(),
            config.config_template(),
        ),
    ] {
        if target.exists() {
            continue;
        }
        match source {
            Some(ArtifactSource::Local(path)) if !path.is_file() => {
                return Err(ArtifactError::SourceMissing(path.clone()));
            }
            Some(_) => {}
            None if !template.is_available() => {
                return Err(ArtifactError::TemplateMissing {
                    target,
                    template: template.to_string(),
                });
            }
            None => {}
        }
    }
    Ok(())
}

fn check_dependencies(runner: &dyn ProcessRunner) -> Result<ComposeCommand, DependencyError> {
    if !runner.is_available("tar") {
        return Err(DependencyError::Missing {
            tool: "tar".to_string(),
            hint: "Install tar and rerun.".to_string(),
        });
    }
    ComposeCommand::detect(runner)
}

/// Resolve, confirm and install
pub async fn run_install(cli: &Cli) -> Result<RunOutcome, InstallerError> {
    let runner = SystemRunner;
    let compose = check_dependencies(&runner)?;

    let inputs = cli.inputs().layered_over(
        RawInputs::from_env().layered_over(RawInputs::load_settings(cli.config.as_deref())?),
    );

    let prompter: Box<dyn Prompter> = if cli.non_interactive {
        Box::new(NonInteractivePrompter)
    } else {
        Box::new(InteractivePrompter)
    };

    let client = http_client()?;
    let prober = SizeProber::new(client.clone());

    run_with(
        inputs,
        cli,
        prompter.as_ref(),
        &prober,
        &runner,
        &client,
        compose,
    )
    .await
}

/// Everything after the host checks. A cancelled prompt ends the run as an abort.
async fn run_with(
    inputs: RawInputs,
    cli: &Cli,
    prompter: &dyn Prompter,
    prober: &SizeProber,
    runner: &dyn ProcessRunner,
    client: &reqwest::Client,
    compose: ComposeCommand,
) -> Result<RunOutcome, InstallerError> {
    match confirm_and_install(inputs, cli, prompter, prober, runner, client, compose).await {
        Err(e) if e.is_user_abort() => {
            println!("{}", "Installation aborted".yellow());
            Ok(RunOutcome::Aborted)
        }
        other => other,
    }
}

async fn confirm_and_install(
    inputs: RawInputs,
    cli: &Cli,
    prompter: &dyn Prompter,
    prober: &SizeProber,
    runner: &dyn ProcessRunner,
    client: &reqwest::Client,
    compose: ComposeCommand,
) -> Result<RunOutcome, InstallerError> {
    let resolution = resolve(inputs, !cli.no_start, prompter, prober).await?;
    log::debug!("Probed sizes: {:?}", resolution.sizes);
    let config = resolution.config;

    print_parameters(&config, compose);
    check_sources(&config)?;

    if cli.dry_run {
        print_plan(&planned_steps(&config, compose));
        return Ok(RunOutcome::DryRun);
    }

    if !prompter.confirm("Proceed with the installation?", true)? {
        println!("{}", "Installation aborted".yellow());
        return Ok(RunOutcome::Aborted);
    }

    apply(&config, runner, client, compose).await?;
    println!("{}", "🎉 Installation complete".green().bold());
    Ok(RunOutcome::Installed)
}
