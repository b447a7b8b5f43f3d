use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

use routekeeper::cache::MemoryCache;
use routekeeper::errors::KeeperError;
use routekeeper::gatekeeper::{AccessPolicy, Gatekeeper};
use routekeeper::routes::manifest::load_manifests;
use routekeeper::routes::{scan, ControllerRegistry};
use routekeeper::settings::Settings;
use routekeeper::storage::{self, SeaOrmStore};
use routekeeper::store::{ensure_role, EntityStore};
use routekeeper::web;

#[derive(Parser, Debug)]
#[command(
    name = "routekeeper",
    version,
    about = "Route discovery and role-based access control"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan controller manifests and print the route tree
    Scan,
    /// Scan and reconcile the routes with the database
    Reconcile,
    /// Evaluate one access check
    Check {
        /// Role to check; repeat for several. Defaults to the guest role
        #[arg(short, long = "role")]
        roles: Vec<String>,
        component: String,
        resource: String,
    },
    /// Run the access API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    let registry = load_manifests(&settings.controllers.dir, &settings.controllers.namespace)?;

    match cli.command {
        Command::Scan => print_scan(&registry)?,
        Command::Reconcile => {
            let keeper = build_keeper(&settings, registry).await?;
            let report = keeper.reconcile_now().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).into_diagnostic()?
            );
            if !report.is_clean() {
                return Err(KeeperError::Other(format!(
                    "{} controller(s) failed to scan and were left untouched",
                    report.failed.len()
                ))
                .into());
            }
        }
        Command::Check {
            roles,
            component,
            resource,
        } => {
            let keeper = build_keeper(&settings, registry).await?;
            keeper.ensure_routes().await?;
            let res = keeper.check_roles(&roles, &component, &resource).await?;
            println!("{}", res.access);
        }
        Command::Serve => {
            let keeper = build_keeper(&settings, registry).await?;
            if let Some(report) = keeper.ensure_routes().await? {
                tracing::info!(
                    added = report.added.len(),
                    removed = report.removed.len(),
                    failed = report.failed.len(),
                    "Routes reconciled at startup"
                );
            }
            web::serve(&settings, keeper).await?;
        }
    }

    Ok(())
}

fn print_scan(registry: &ControllerRegistry) -> std::result::Result<(), KeeperError> {
    let scan = scan(registry);
    println!("{}", serde_json::to_string_pretty(&scan.tree)?);
    if !scan.is_clean() {
        return Err(KeeperError::Other(format!(
            "{} controller(s) failed to scan",
            scan.errors.len()
        )));
    }
    Ok(())
}

async fn build_keeper(
    settings: &Settings,
    registry: ControllerRegistry,
) -> std::result::Result<Arc<Gatekeeper>, KeeperError> {
    // init storage (database)
    let db = storage::init(&settings.database).await?;
    let store: Arc<dyn EntityStore> = Arc::new(SeaOrmStore::new(db));

    if settings.access.seed_roles {
        ensure_role(
            store.as_ref(),
            &settings.access.default_role,
            "Unauthenticated callers",
        )
        .await?;
        ensure_role(
            store.as_ref(),
            &settings.access.super_role,
            "Bypasses every access check",
        )
        .await?;
    }

    Ok(Arc::new(Gatekeeper::new(
        store,
        Arc::new(MemoryCache::new(settings.cache.max_entries)),
        Arc::new(registry),
        AccessPolicy::from(settings),
    )))
}
