use clap::Parser;

use parley_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	parley_eval::run(args).await
}
