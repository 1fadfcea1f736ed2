//! `olio hydrate`: run the coordinator against a fixture world

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use olio_session::{
    FileKeyValueStore, HydrationConfig, HydrationCoordinator, KeyValueStore,
    MemoryIdentityProvider, MemoryKeyValueStore,
};
use olio_types::{HydrationSnapshot, Identity};
use tracing::info;

use crate::error::CliResult;
use crate::fixture::{ReplayEvent, WorldFixture};
use crate::output::print_json;

#[derive(Debug, Args)]
pub struct HydrateArgs {
    /// JSON fixture describing the session and tenant tables
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Persist the bootstrap cache in this directory (in memory otherwise)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Comma-separated steps to replay once settled
    /// (sign-in:<user>, sign-out, refresh, reload)
    #[arg(short, long, value_delimiter = ',')]
    pub events: Vec<ReplayEvent>,

    /// Also print the first snapshot, before any network resolution
    #[arg(long)]
    pub show_initial: bool,
}

/// Execute the hydrate command
pub async fn execute(args: HydrateArgs, config: HydrationConfig) -> CliResult<()> {
    let show_initial = args.show_initial;
    let (initial, settled) = hydrate(args, config).await?;
    if show_initial {
        print_json(initial.as_ref())?;
    }
    print_json(settled.as_ref())
}

/// Returns the first snapshot and the one after the last replayed step.
pub async fn hydrate(
    args: HydrateArgs,
    config: HydrationConfig,
) -> CliResult<(Arc<HydrationSnapshot>, Arc<HydrationSnapshot>)> {
    let world = WorldFixture::load(&args.fixture)?;
    let provider = Arc::new(world.identity_provider(config.event_capacity));
    let store = Arc::new(world.tenant_store());
    let kv: Arc<dyn KeyValueStore> = match &args.cache_dir {
        Some(dir) => Arc::new(FileKeyValueStore::open(dir)?),
        None => Arc::new(MemoryKeyValueStore::new()),
    };

    let coordinator = Arc::new(HydrationCoordinator::new(
        provider.clone(),
        store,
        kv,
        config,
    ));
    let initial = coordinator.snapshot();

    let mounted = coordinator.mount();
    let mut snapshot = coordinator.wait_until_settled().await;
    // Replayed steps drive the coordinator directly, so each one returns
    // the snapshot of its own run rather than racing the event listener.
    mounted.unmount();
    for event in args.events {
        snapshot = replay(&coordinator, &provider, event).await;
    }

    Ok((initial, snapshot))
}

async fn replay(
    coordinator: &HydrationCoordinator,
    provider: &MemoryIdentityProvider,
    event: ReplayEvent,
) -> Arc<HydrationSnapshot> {
    info!(?event, "Replaying step");
    match event {
        ReplayEvent::SignIn(user) => {
            provider.sign_in(Identity::new(user));
            coordinator.refresh().await;
            coordinator.snapshot()
        }
        ReplayEvent::SignOut => {
            coordinator.sign_out().await;
            coordinator.snapshot()
        }
        ReplayEvent::Refresh => {
            coordinator.refresh().await;
            coordinator.snapshot()
        }
        ReplayEvent::Reload => {
            coordinator.reload_org().await;
            coordinator.snapshot()
        }
    }
}
