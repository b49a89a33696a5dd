use clap::Parser;
use tb_cli::{cli::Cli, logging, serve};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = serve::run(cli).await {
		eprintln!("termbridge: {err:#}");
		std::process::exit(1);
	}
}
