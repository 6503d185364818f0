use clap::Parser;
use colored::Colorize;

use linkhub::cli::Cli;

#[actix_web::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = linkhub::runtime::run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
