use std::path::Path;

use serde_json::json;

use crate::{
    InitArgs,
    config::{CONFIG_FILE, SiteConfig},
};

const INDEX_MD: &str = "---
title: Home
permalink: false
---
# Hello

This page was generated by `stitch init`.
";

const DEFAULT_LAYOUT: &str = "<!doctype html>
<html>
<head>
  <meta charset=\"utf-8\">
  <title>{% if title %}{{ title }} | {% endif %}{{ site.title }}</title>
  <link rel=\"stylesheet\" href=\"/css/main.css\">
</head>
<body>
{{ contents }}
</body>
</html>
";

const MAIN_SCSS: &str = "$text: #222;

body {
  color: $text;
  font-family: sans-serif;
}
";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    let mut default_config = SiteConfig::default();
    default_config.metadata.insert(
        "site".to_string(),
        json!({ "title": "My Site", "url": "https://example.com" }),
    );

    println!("Initializing project in {}", path.display());

    let config_text = serde_yaml::to_string(&default_config)?;
    tokio::fs::write(&config_file, config_text).await?;
    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    let source_dir = path.join(&default_config.source);
    write_starter(&source_dir.join("index.md"), INDEX_MD).await?;
    write_starter(&source_dir.join("layouts/default.html"), DEFAULT_LAYOUT).await?;
    write_starter(&source_dir.join("css/main.scss"), MAIN_SCSS).await?;

    Ok(())
}

/// Write a starter file unless something is already there.
async fn write_starter(path: &Path, contents: &str) -> Result<(), anyhow::Error> {
    if path.exists() {
        println!("Skipped existing {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    println!("Created {}", path.display());
    Ok(())
}
