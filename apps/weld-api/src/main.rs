use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = weld_api::Args::parse();
	weld_api::run(args).await
}
