use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = tether_api::Args::parse();

	tether_api::run(args).await
}
