use std::path::Path;

use crate::{build::Builder, config::SiteConfig};

pub async fn run(config_file: Option<&Path>) -> Result<(), anyhow::Error> {
    let (config, base_path) = SiteConfig::load_from_arg(config_file)?;

    let builder = Builder::new(config, base_path);
    builder.build()?;

    println!("Site build complete!");

    Ok(())
}
