use crate::config::InstallConfig;
use crate::downloader::DownloadProgress;
use crate::orchestrator::ComposeCommand;
use crate::probe::{format_size, SizeSummary};
use crate::sources::ArtifactSource;
use colored::Colorize;
use std::io;
use std::io::Write;

const BAR_WIDTH: usize = 30;

/// One status line for a running download
fn progress_line(progress: &DownloadProgress) -> String {
    let speed = format_size(progress.speed_bytes_per_sec as u64);
    if progress.total == 0 {
        return format!("📥 {} at {speed}/s", format_size(progress.downloaded));
    }

    let ratio = (progress.downloaded as f64 / progress.total as f64).min(1.0);
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!(
        "📥 {:>3}% |{}{}| {} of {} at {speed}/s",
        (ratio * 100.0).floor() as u8,
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        format_size(progress.downloaded),
        format_size(progress.total),
    )
}

/// Redraw the download status in place
pub fn display_progress(progress: &DownloadProgress) {
    print!("\r{}   ", progress_line(progress));
    let _ = io::stdout().flush();
}

fn describe(source: &ArtifactSource, sizes: Option<String>) -> String {
    match source {
        ArtifactSource::Remote(url) => {
            format!("{url} [{}]", sizes.unwrap_or_else(|| "unknown".to_string()))
        }
        ArtifactSource::Local(path) => format!("{} [local file, no download]", path.display()),
    }
}

/// Candidate downloads with their probed sizes
pub fn print_download_summary(
    node: Option<&ArtifactSource>,
    mdw: Option<&ArtifactSource>,
    sizes: &SizeSummary,
) {
    println!("{}", "📦 Snapshots".green().bold());
    if let Some(node) = node {
        let size = sizes.node.as_ref().map(|d| d.human_readable_size());
        println!("   Node:       {}", describe(node, size));
    }
    if let Some(mdw) = mdw {
        let size = sizes.mdw.as_ref().map(|d| d.human_readable_size());
        println!("   Middleware: {}", describe(mdw, size));
    }
    match sizes.estimate {
        Some(estimate) => {
            println!("   Total download: {}", format_size(estimate.total_bytes));
            println!(
                "   Recommended free space: {}",
                format_size(estimate.recommended_free_bytes)
            );
        }
        None => println!("   Required space: unknown"),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Full parameter summary shown before the final confirmation
pub fn print_parameters(config: &InstallConfig, compose: ComposeCommand) {
    let layout = config.layout();
    println!();
    println!("{}", "📋 Installation parameters".green().bold());
    println!("   Network:           {} ({})", config.network, layout.network_label);
    println!("   Variant:           {}", config.variant);
    println!("   Install directory: {}", config.install_dir.display());
    println!("   Data directory:    {}", layout.data_root.display());
    println!("   App directory:     {}", layout.app_root.display());
    println!(
        "   Node snapshot:     {} (download: {})",
        config.node_archive,
        yes_no(config.download_node)
    );
    println!(
        "   MDW snapshot:      {} (download: {})",
        config.mdw_archive,
        yes_no(config.download_mdw)
    );
    match &config.manifest_source {
        Some(source) => println!("   Compose file:      {source}"),
        None => println!("   Compose file:      {}", config.manifest_template()),
    }
    match &config.config_source {
        Some(source) => println!("   Node config:       {source}"),
        None => println!("   Node config:       {}", config.config_template()),
    }
    println!("   ERL_FLAGS:         {}", config.runtime.erl_flags);
    println!("   Orchestrator:      {compose}");
    println!("   Start afterwards:  {}", yes_no(config.start_after));
    if config.non_interactive {
        println!("   Mode:              non-interactive");
    }
    println!();
}

/// Ordered list of the actions a real run would take
pub fn print_plan(steps: &[String]) {
    println!("{}", "🧪 Dry run: nothing will be changed".yellow().bold());
    for (index, step) in steps.iter().enumerate() {
        println!("  {}. {step}", index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_shows_share_of_total() {
        let line = progress_line(&DownloadProgress {
            downloaded: 512 * 1024 * 1024,
            total: 1024 * 1024 * 1024,
            speed_bytes_per_sec: 2.0 * 1024.0 * 1024.0,
        });
        assert_eq!(
            line,
            format!(
                "📥  50% |{}{}| 512.00 MB of 1.00 GB at 2.00 MB/s",
                "#".repeat(15),
                "-".repeat(15)
            )
        );
    }

    #[test]
    fn progress_line_without_total_shows_bytes_only() {
        let line = progress_line(&DownloadProgress {
            downloaded: 3 * 1024 * 1024,
            total: 0,
            speed_bytes_per_sec: 0.0,
        });
        assert_eq!(line, "📥 3.00 MB at 0.00 MB/s");
    }

    #[test]
    fn describes_sources() {
        let remote = ArtifactSource::Remote("https://host/a.tar.zst".into());
        assert_eq!(describe(&remote, None), "https://host/a.tar.zst [unknown]");
        assert_eq!(
            describe(&remote, Some("1.00 GB".into())),
            "https://host/a.tar.zst [1.00 GB]"
        );
        let local = ArtifactSource::Local("/srv/a.tar.zst".into());
        assert_eq!(describe(&local, None), "/srv/a.tar.zst [local file, no download]");
    }
}
