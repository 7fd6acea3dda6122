//! Config subcommands handler

use anyhow::{bail, Result};

use ocitools::cli::GlobalArgs;
use ocitools::{Config, Profile};

/// Show the loaded configuration as TOML, defaults filled in.
#[cfg(not(tarpaulin_include))]
pub fn handle_show(global: &GlobalArgs) -> Result<()> {
    let config = Config::load(global.config_file.as_deref())?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Print the configuration path in use, whether or not it exists.
pub fn handle_path(global: &GlobalArgs) -> Result<()> {
    let path = Config::resolve_path(global.config_file.as_deref())?;
    println!("{}", path.display());
    Ok(())
}

/// Write a starter configuration with the selected profile.
pub fn handle_init(global: &GlobalArgs, tenancy: &str, region: &str, force: bool) -> Result<()> {
    let path = Config::resolve_path(global.config_file.as_deref())?;
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let mut config = Config::default();
    config
        .profiles
        .insert(global.profile.clone(), Profile::new(tenancy, region));
    config.validate()?;
    config.save_to(&path)?;

    if !global.quiet {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
