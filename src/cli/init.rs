//! Init command implementation.

use super::Project;
use crate::config::Configuration;
use crate::naming::NamingScheme;
use anyhow::Result;
use clap::Args;

/// Arguments for the init command
#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,

    /// Backup naming scheme (version, timestamp or simple)
    #[arg(long, default_value_t = NamingScheme::Version)]
    pub naming_scheme: NamingScheme,

    /// Backups kept per file, 0 keeps all
    #[arg(long, default_value_t = crate::config::DEFAULT_KEEP_HISTORY)]
    pub keep_history: usize,
}

/// Run the init command
pub fn run(args: InitArgs, project: &Project) -> Result<()> {
    if project.config_path.exists() && !args.force {
        println!(
            "Config file '{}' already exists. Use --force to overwrite.",
            project.config_path.display()
        );
        return Ok(());
    }

    let config = Configuration {
        naming_scheme: args.naming_scheme,
        keep_history: args.keep_history,
        ..Default::default()
    };
    project.save(&config)?;

    println!("Created config file: {}", project.config_path.display());
    println!("Run 'verctrl add smart' or 'verctrl track <files>' to choose files.");
    Ok(())
}
