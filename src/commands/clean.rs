use std::path::Path;

use crate::{CleanArgs, build::clean_dir, config::SiteConfig};

pub async fn run(config_file: Option<&Path>, args: &CleanArgs) -> Result<(), anyhow::Error> {
    let (config, base_path) = SiteConfig::load_from_arg(config_file)?;

    // Delete the generated site folder
    let site_path = config.destination_dir(&base_path);
    if site_path.exists() {
        if args.dry_run {
            println!("Would delete {}", site_path.display());
        } else {
            clean_dir(&site_path)?;
            println!("Deleted {}", site_path.display());
        }
    } else {
        println!("Nothing to clean at {}", site_path.display());
    }

    Ok(())
}
