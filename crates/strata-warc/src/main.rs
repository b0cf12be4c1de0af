//! `strata-warc` binary.

use std::process;

#[tokio::main]
async fn main() {
	env_logger::init();

	let mut stdout = std::io::stdout().lock();
	let code = strata_warc::run(std::env::args_os().skip(1), &mut stdout).await;
	process::exit(code);
}
