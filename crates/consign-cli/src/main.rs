//! `consign` binary.

#[tokio::main]
async fn main() {
    let code = consign_cli::run().await;
    if code != 0 {
        std::process::exit(code);
    }
}
