// Binary entry point for the command-line client.
use anyhow::Result;
use gsa_portal::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let parsed = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Run 'gsa-portal --help' for usage.");
            std::process::exit(2);
        }
    };

    cli::run(parsed).await
}
