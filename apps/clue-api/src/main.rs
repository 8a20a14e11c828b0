use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = clue_api::Args::parse();

	clue_api::run(args).await
}
