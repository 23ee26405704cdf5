pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = fanout_cli::VERSION,
	rename_all = "kebab",
	styles = fanout_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = fanout_config::load(&args.config)?;

	init_tracing(&config);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let sweep_interval = Duration::from_secs(config.cache.sweep_interval_secs);
	let state = AppState::new(config).await?;
	let sweeper = state
		.service
		.cache
		.is_enabled()
		.then(|| state.service.cache.spawn_sweeper(sweep_interval));
	let cache = state.service.cache.clone();
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let served = axum::serve(listener, app).await;

	if let Some(sweeper) = sweeper {
		sweeper.abort();
	}

	cache.flush().await;

	served?;

	Ok(())
}

fn init_tracing(config: &fanout_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
