use anyhow::Context;
use clap::Parser;
use docnav::cli::{Cli, Commands};
use docnav::search::{MatchMode, SearchRequest};
use docnav::{Config, DocNavServer, ModulePath, QueryService, SnapshotStore};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.inputs, cli.cache_path);
    docnav::tracing::init_with(&config.log);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted; abandoning in-flight generation");
                shutdown.cancel();
            }
        }
    });

    let config = Arc::new(config);
    let store = Arc::new(SnapshotStore::new());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, store, shutdown).await,
        Commands::Check => {
            let snapshot = docnav::refresh(&config, &store, &shutdown).await?;
            println!(
                "{} entries in {} modules, fingerprint {:016x}",
                snapshot.global().len(),
                snapshot.global().module_tree().len(),
                snapshot.fingerprint()
            );
            Ok(())
        }
        Commands::Search {
            query,
            offset,
            limit,
            substring,
        } => {
            docnav::startup(&config, &store, &shutdown).await?;
            let request = SearchRequest {
                query,
                offset,
                limit,
                mode: if substring {
                    MatchMode::Substring
                } else {
                    MatchMode::Prefix
                },
            };
            let response = QueryService::new(store, config.search.clone()).search(&request)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Sidebar { module, js } => {
            let snapshot = docnav::startup(&config, &store, &shutdown).await?;
            let module = ModulePath::parse(&module)?;
            let tree = docnav::render_sidebar(snapshot.global(), &module)
                .with_context(|| format!("Unknown module `{}`", module))?;
            if js {
                println!("{}", tree.to_sidebar_items().to_js());
            } else {
                print!("{}", tree);
            }
            Ok(())
        }
    }
}

async fn serve(
    config: Arc<Config>,
    store: Arc<SnapshotStore>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("Starting docnav MCP server");

    // Queries answer NotReady until a generation succeeds; `regenerate` can retry later.
    if let Err(e) = docnav::startup(&config, &store, &shutdown).await {
        tracing::error!("Initial generation failed: {:#}", e);
    }

    let server = DocNavServer::new(config, store, shutdown);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    Ok(())
}
