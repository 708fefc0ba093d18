use clap::Parser;

use ppk_logger::validator::validate;

use std::path::PathBuf;

use tracing::error;

/// Check that a UBX log is suitable for PPK processing
#[derive(Parser)]
#[clap(about)]
struct Args {
    /// UBX log file
    pub path: PathBuf,
    /// Print the report as JSON
    #[clap(long)]
    pub json: bool,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let report = match validate(&args.path) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", report.to_json());
    } else {
        println!("{}", report);
    }

    std::process::exit(if report.valid { 0 } else { 1 });
}
