#[tokio::main]
async fn main() {
    if let Err(e) = idgate::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
