use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = fanout_api::Args::parse();

	fanout_api::run(args).await
}
