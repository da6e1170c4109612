//! Snapshot extraction
//!
//! Snapshots are zstd-compressed tarballs. GNU tar built with zstd support
//! handles them natively; otherwise the standalone `zstd` tool decompresses
//! to an intermediate tarball first.

use crate::error::ExtractionError;
use crate::process::{CommandSpec, ProcessOutput, ProcessRunner};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarZst,
    TarGz,
    Tar,
}

impl ArchiveFormat {
    /// Guess the format from the file name; unknown names are assumed zstd
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveFormat::TarGz
        } else if name.ends_with(".tar") {
            ArchiveFormat::Tar
        } else {
            ArchiveFormat::TarZst
        }
    }
}

/// How zstd archives can be unpacked on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZstdCapability {
    /// `tar --zstd`
    NativeTar,
    /// `zstd -d` to an intermediate tarball, then `tar -xf`
    ZstdTool,
}

/// Find the best available way of unpacking zstd archives
pub fn detect_zstd_capability(
    runner: &dyn ProcessRunner,
) -> Result<ZstdCapability, ExtractionError> {
    match runner.run(&CommandSpec::new("tar").arg("--help")) {
        Ok(output) if output.success() && output.stdout.contains("--zstd") => {
            log::debug!("tar supports --zstd");
            return Ok(ZstdCapability::NativeTar);
        }
        Ok(_) => log::debug!("tar does not advertise --zstd"),
        Err(e) => log::debug!("Unable to query tar capabilities: {e}"),
    }

    if runner.is_available("zstd") {
        log::debug!("Falling back to the zstd tool");
        return Ok(ZstdCapability::ZstdTool);
    }

    Err(ExtractionError::NoCapability(
        "tar lacks --zstd and the zstd tool is not installed. Install zstd (e.g. `apt install zstd`) and rerun"
            .to_string(),
    ))
}

fn check(tool: &str, output: ProcessOutput) -> Result<(), ExtractionError> {
    if output.success() {
        Ok(())
    } else {
        Err(ExtractionError::Command {
            tool: tool.to_string(),
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

fn intermediate_path(archive: &Path, dest_dir: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());
    let stem = name
        .strip_suffix(".tar.zst")
        .or_else(|| name.strip_suffix(".tzst"))
        .or_else(|| name.strip_suffix(".zst"))
        .unwrap_or(&name);
    dest_dir.join(format!(".{stem}.tar"))
}

/// Unpack `archive` into `dest_dir`, creating it if needed
pub fn extract(
    runner: &dyn ProcessRunner,
    archive: &Path,
    dest_dir: &Path,
) -> Result<(), ExtractionError> {
    if !archive.is_file() {
        return Err(ExtractionError::ArchiveNotFound(archive.to_path_buf()));
    }
    fs::create_dir_all(dest_dir)?;

    log::info!(
        "Extracting {} to {}",
        archive.display(),
        dest_dir.display()
    );

    let archive_str = archive.to_string_lossy().into_owned();
    let dest_str = dest_dir.to_string_lossy().into_owned();

    let flags: &[&str] = match ArchiveFormat::from_path(archive) {
        ArchiveFormat::Tar => &["-xf"],
        ArchiveFormat::TarGz => &["-xzf"],
        ArchiveFormat::TarZst => match detect_zstd_capability(runner)? {
            ZstdCapability::NativeTar => &["--zstd", "-xf"],
            ZstdCapability::ZstdTool => return extract_via_zstd(runner, archive, dest_dir),
        },
    };

    let spec = CommandSpec::new("tar")
        .args(flags)
        .args([archive_str.as_str(), "-C", dest_str.as_str()]);
    check("tar", runner.run(&spec)?)
}

fn extract_via_zstd(
    runner: &dyn ProcessRunner,
    archive: &Path,
    dest_dir: &Path,
) -> Result<(), ExtractionError> {
    let intermediate = intermediate_path(archive, dest_dir);
    let intermediate_str = intermediate.to_string_lossy().into_owned();
    let archive_str = archive.to_string_lossy().into_owned();
    let dest_str = dest_dir.to_string_lossy().into_owned();

    let result = runner
        .run(&CommandSpec::new("zstd").args([
            "-d",
            "-f",
            "-o",
            intermediate_str.as_str(),
            archive_str.as_str(),
        ]))
        .map_err(ExtractionError::from)
        .and_then(|output| check("zstd", output))
        .and_then(|_| {
            let output = runner.run(&CommandSpec::new("tar").args([
                "-xf",
                intermediate_str.as_str(),
                "-C",
                dest_str.as_str(),
            ]))?;
            check("tar", output)
        });

    if intermediate.exists() {
        if let Err(e) = fs::remove_file(&intermediate) {
            log::warn!(
                "Error deleting intermediate tarball {}: {e}",
                intermediate.display()
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{failed, ok, FakeRunner};
    use tempfile::tempdir;

    fn archive_in(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"compressed").unwrap();
        path
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ArchiveFormat::from_path(Path::new("a.tar.zst")), ArchiveFormat::TarZst);
        assert_eq!(ArchiveFormat::from_path(Path::new("a.TGZ")), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::from_path(Path::new("a.tar.gz")), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::from_path(Path::new("a.tar")), ArchiveFormat::Tar);
        assert_eq!(ArchiveFormat::from_path(Path::new("latest")), ArchiveFormat::TarZst);
    }

    #[test]
    fn prefers_native_tar() {
        let temp = tempdir().unwrap();
        let archive = archive_in(temp.path(), "node.tar.zst");
        let dest = temp.path().join("data").join("mainnet");

        let runner = FakeRunner::new(&["tar", "zstd"])
            .on("tar --help", |_| ok("  --zstd   filter the archive through zstd"));

        extract(&runner, &archive, &dest).unwrap();

        assert!(dest.is_dir());
        let calls = runner.rendered_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[1],
            format!("tar --zstd -xf {} -C {}", archive.display(), dest.display())
        );
    }

    #[test]
    fn falls_back_to_zstd_and_removes_intermediate() {
        let temp = tempdir().unwrap();
        let archive = archive_in(temp.path(), "mdw.tar.zst");
        let dest = temp.path().join("data");

        let runner = FakeRunner::new(&["tar", "zstd"])
            .on("tar --help", |_| ok("GNU tar without compression filters"))
            .on("zstd -d", |spec| {
                let out = &spec.args[3];
                fs::write(out, b"tarball").unwrap();
                ok("")
            });

        extract(&runner, &archive, &dest).unwrap();

        let intermediate = dest.join(".mdw.tar");
        let calls = runner.rendered_calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].starts_with("zstd -d -f -o"));
        assert_eq!(
            calls[2],
            format!("tar -xf {} -C {}", intermediate.display(), dest.display())
        );
        assert!(!intermediate.exists());
    }

    #[test]
    fn no_capability_is_an_error() {
        let temp = tempdir().unwrap();
        let archive = archive_in(temp.path(), "node.tar.zst");

        let runner = FakeRunner::new(&["tar"]).on("tar --help", |_| ok("bsdtar 3.6"));

        let err = extract(&runner, &archive, &temp.path().join("out")).unwrap_err();
        match err {
            ExtractionError::NoCapability(hint) => assert!(hint.contains("Install zstd")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failing_tar_is_reported() {
        let temp = tempdir().unwrap();
        let archive = archive_in(temp.path(), "node.tar.gz");

        let runner = FakeRunner::new(&["tar"]).on("tar -xzf", |_| failed(2, "unexpected EOF"));

        let err = extract(&runner, &archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Command { ref tool, code: Some(2), ref stderr } if tool == "tar" && stderr == "unexpected EOF"
        ));
    }

    #[test]
    fn failing_zstd_still_cleans_up() {
        let temp = tempdir().unwrap();
        let archive = archive_in(temp.path(), "node.tar.zst");
        let dest = temp.path().join("out");

        let runner = FakeRunner::new(&["tar", "zstd"])
            .on("tar --help", |_| ok(""))
            .on("zstd -d", |spec| {
                fs::write(&spec.args[3], b"partial").unwrap();
                failed(1, "corrupted block")
            });

        let err = extract(&runner, &archive, &dest).unwrap_err();
        assert!(matches!(err, ExtractionError::Command { ref tool, .. } if tool == "zstd"));
        assert!(!dest.join(".node.tar").exists());
        assert_eq!(runner.rendered_calls().len(), 2);
    }

    #[test]
    fn missing_archive_is_reported() {
        let temp = tempdir().unwrap();
        let runner = FakeRunner::new(&["tar"]);
        let err = extract(&runner, &temp.path().join("absent.tar.zst"), temp.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::ArchiveNotFound(_)));
        assert!(runner.rendered_calls().is_empty());
    }
}
