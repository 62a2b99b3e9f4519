//! Track and untrack command implementations.

use super::Project;
use anyhow::{bail, Result};
use clap::Args;
use std::path::{Component, Path, PathBuf};

/// Arguments shared by track and untrack
#[derive(Args)]
pub struct TrackArgs {
    /// Paths relative to the project root
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// Run the track command
pub fn run_track(args: TrackArgs, project: &Project) -> Result<()> {
    let mut config = project.load_or_init()?;

    let paths: Vec<PathBuf> = args
        .paths
        .iter()
        .map(|path| relative_to_root(project, path))
        .collect();

    if let Some(outside) = paths.iter().find(|path| escapes_root(path)) {
        bail!(
            "{} is outside the project root {}",
            outside.display(),
            project.root.display()
        );
    }

    for path in &paths {
        if !project.root.join(path).is_file() {
            println!("Note: {} does not exist yet", path.display());
        }
    }

    let added = config.add_files(&paths);
    project.save(&config)?;

    println!("Now tracking {} new file(s), {} total", added, config.files.len());
    Ok(())
}

/// Run the untrack command
pub fn run_untrack(args: TrackArgs, project: &Project) -> Result<()> {
    let mut config = project.load()?;

    let paths: Vec<PathBuf> = args
        .paths
        .iter()
        .map(|path| relative_to_root(project, path))
        .collect();

    let removed = config.remove_files(&paths);
    project.save(&config)?;

    println!("Stopped tracking {} file(s), {} remaining", removed, config.files.len());
    Ok(())
}

/// Absolute paths under the project root are stored relative to it
fn relative_to_root(project: &Project, path: &Path) -> PathBuf {
    if path.is_absolute() {
        if let Ok(rel) = path.strip_prefix(&project.root) {
            return rel.to_path_buf();
        }
    }
    path.to_path_buf()
}

/// Whether a root-relative path still points outside the root
fn escapes_root(path: &Path) -> bool {
    path.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_track_then_untrack() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let project = Project::new(temp_dir.path().join("verctrl.json"));

        let args = TrackArgs {
            paths: vec![
                PathBuf::from("notes.txt"),
                project.root.join("src/lib.rs"),
                PathBuf::from("./notes.txt"),
            ],
        };
        run_track(args, &project)?;
        assert_eq!(
            project.load()?.files,
            vec!["notes.txt".to_string(), "src/lib.rs".to_string()]
        );

        let args = TrackArgs {
            paths: vec![PathBuf::from("notes.txt")],
        };
        run_untrack(args, &project)?;
        assert_eq!(project.load()?.files, vec!["src/lib.rs".to_string()]);
        Ok(())
    }

    #[test]
    fn test_track_rejects_paths_outside_root() -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let project = Project::new(temp_dir.path().join("verctrl.json"));

        for outside in ["../sibling/notes.txt", "/etc/hosts"] {
            let args = TrackArgs {
                paths: vec![PathBuf::from("inside.txt"), PathBuf::from(outside)],
            };
            let err = run_track(args, &project).unwrap_err();
            assert!(err.to_string().contains("outside the project root"));
        }

        assert!(project.load()?.files.is_empty());
        Ok(())
    }
}
