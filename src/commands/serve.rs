use std::convert::Infallible;
use std::path::{Path, PathBuf};

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use futures_util::stream::Stream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{
    ServeArgs,
    build::{
        Builder, FileWatcher, GlobSet, PathClassifier, RebuildScope, RuleTable, Source,
        WatchEvent, pipeline::LIVE_RELOAD_PATH,
    },
    config::{ServeConfig, SiteConfig, WatchConfig},
};

/// SSE handler for live reload notifications.
async fn live_reload_handler(
    State(tx): State<broadcast::Sender<()>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = tx.subscribe();
    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(_) => {
                    yield Ok(Event::default().event("reload").data("reload"));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed some messages, a single reload is enough
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn run(config_file: Option<&Path>, args: &ServeArgs) -> Result<(), anyhow::Error> {
    let (config, base_path) = SiteConfig::load_from_arg(config_file)?;

    let defaults = config.serve.clone().unwrap_or_default();
    let serve = ServeConfig {
        host: args.host.clone().unwrap_or(defaults.host),
        port: args.port.unwrap_or(defaults.port),
    };
    let watch = if args.no_watch {
        None
    } else {
        Some(config.watch.clone().unwrap_or_default())
    };

    run_site(config, base_path, Some(serve), watch, args.open).await
}

/// Build the site, then serve and watch it as requested.
///
/// Returns once the build is done if neither serving nor watching;
/// otherwise runs until the process is stopped.
pub async fn run_site(
    config: SiteConfig,
    base_path: PathBuf,
    serve: Option<ServeConfig>,
    watch: Option<WatchConfig>,
    open: bool,
) -> Result<(), anyhow::Error> {
    let live_reload = serve.is_some() && watch.as_ref().is_some_and(|w| w.live_reload);

    let builder = Builder::new(config, base_path).with_live_reload(live_reload);
    let result = builder.build()?;
    println!("Site build complete!");

    // Create broadcast channel for live reload
    let (reload_tx, _) = broadcast::channel::<()>(16);

    let watcher_handle = match watch {
        Some(watch) => Some(spawn_watcher(builder, &watch, live_reload, reload_tx.clone())?),
        None => None,
    };

    let Some(serve) = serve else {
        if let Some(handle) = watcher_handle {
            handle.await?;
        }
        return Ok(());
    };

    // Create the static file server
    let serve_dir = ServeDir::new(&result.output_dir).append_index_html_on_directories(true);

    // Build router with SSE endpoint for live reload
    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(live_reload_handler))
        .with_state(reload_tx)
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http());

    // Determine the URL to display
    let display_host = if serve.host == "0.0.0.0" {
        "localhost"
    } else {
        &serve.host
    };
    let url = format!("http://{}:{}", display_host, serve.port);

    // A port already in use ends the run here
    let listener = bind(&serve).await?;

    println!("\nServing site at {}", url);
    println!("Press Ctrl+C to stop\n");

    // Open browser if requested
    if open && let Err(e) = open::that(&url) {
        tracing::warn!("failed to open browser: {}", e);
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Bind the server socket; the host may be an address or a name.
async fn bind(serve: &ServeConfig) -> std::io::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((serve.host.as_str(), serve.port)).await
}

/// Start the file watcher and the rebuild loop.
///
/// Rebuilds run one at a time on a single blocking task, in the order the
/// changes arrive.
fn spawn_watcher(
    builder: Builder,
    watch: &WatchConfig,
    live_reload: bool,
    reload_tx: broadcast::Sender<()>,
) -> Result<JoinHandle<()>, anyhow::Error> {
    let config = builder.config();
    let source_dir = builder.source_dir();
    let ignore = GlobSet::new(&config.ignore)?;
    let rules = RuleTable::new(&watch.rules)?;

    let classifier = PathClassifier::new(&source_dir, &config.layouts_dir(builder.base_path()));
    let watcher = FileWatcher::new(watch, classifier)?;
    println!("Watching {} for changes...", source_dir.display());

    Ok(tokio::task::spawn_blocking(move || {
        while let Some(event) = watcher.recv() {
            let scope = match event {
                WatchEvent::FilesChanged(changed) => {
                    tracing::info!("detected {} change(s)", changed.len());
                    let sources = Source::new(&source_dir, &ignore)
                        .list()
                        .unwrap_or_else(|e| {
                            tracing::warn!("failed to list sources: {}", e);
                            Vec::new()
                        });
                    rules.scope(&changed, &sources)
                }
                WatchEvent::LayoutsChanged => {
                    tracing::info!("layouts changed");
                    RebuildScope::Full
                }
                WatchEvent::Error(e) => {
                    tracing::error!("watch error: {}", e);
                    continue;
                }
            };

            if let RebuildScope::Paths(paths) = &scope
                && paths.is_empty()
            {
                continue;
            }

            match builder.rebuild(&scope) {
                Ok(result) => {
                    tracing::info!("rebuilt {} file(s)", result.files);
                    // Notify connected browsers to reload
                    if live_reload && result.files > 0 {
                        let _ = reload_tx.send(());
                    }
                }
                Err(e) => tracing::error!("build error: {}", e),
            }
        }
    }))
}
