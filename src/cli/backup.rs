//! New-backup command implementation.

use super::Project;
use crate::backup::{BackupEngine, BackupRunResult, FileReport};
use anyhow::{bail, Result};
use clap::Args;
use std::path::Path;

/// Arguments for the new command
#[derive(Args)]
pub struct NewArgs {}

/// Run the new command
pub fn run(_args: NewArgs, project: &Project) -> Result<()> {
    let config = project.load()?;

    if config.files.is_empty() {
        println!("No files specified in config!");
        println!("Run 'verctrl add smart' or 'verctrl track <files>' first.");
        return Ok(());
    }

    println!("Creating backups in {} ...", config.backup_dir.display());
    let engine = BackupEngine::new(&project.root);
    let result = engine.run_backup(&config);

    for report in &result.files {
        print_report(report);
    }
    print_summary(&result);

    if result.failed() > 0 {
        bail!("{} file(s) could not be backed up", result.failed());
    }
    Ok(())
}

fn print_report(report: &FileReport) {
    let path = report.tracked.relative.display();

    match &report.outcome {
        Ok(done) => {
            println!(
                "  ok       {} -> {} ({} bytes)",
                path,
                file_name(&done.backup_path),
                done.bytes
            );
            for pruned in &done.pruned {
                println!("  pruned   {}", file_name(pruned));
            }
            if done.source_reset {
                println!("  reset    {}", path);
            }
        }
        Err(_) if report.is_missing() => println!("  missing  {}", path),
        Err(e) => println!("  failed   {}: {}", path, e),
    }

    for warning in &report.warnings {
        println!("  warning  {}: {}", path, warning);
    }
}

fn print_summary(result: &BackupRunResult) {
    println!();
    println!(
        "Backed up {} of {} file(s), {} missing, {} failed",
        result.succeeded(),
        result.files.len(),
        result.missing(),
        result.failed()
    );
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_backs_up_and_reports_missing() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let project = Project::new(temp_dir.path().join("verctrl.json"));
        fs::write(project.root.join("a.txt"), "alpha").unwrap();
        project.save(&Configuration {
            files: vec!["a.txt".into(), "gone.txt".into()],
            ..Default::default()
        })?;

        run(NewArgs {}, &project)?;

        let backup = project.root.join(".verctrl_backups").join("a-v1.txt");
        assert_eq!(fs::read_to_string(backup).unwrap(), "alpha");
        Ok(())
    }

    #[test]
    fn test_new_without_config_fails() {
        let temp_dir = TempDir::new().unwrap();
        let project = Project::new(temp_dir.path().join("verctrl.json"));

        assert!(run(NewArgs {}, &project).is_err());
    }
}
