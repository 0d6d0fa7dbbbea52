// src/main.rs

use filepulse::errors::Error;
use filepulse::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("filepulse error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> Result<(), Error> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
