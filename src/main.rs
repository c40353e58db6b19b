#[tokio::main]
async fn main() {
    if let Err(e) = cropai_lib::run().await {
        eprintln!("cropai: {e}");
        std::process::exit(1);
    }
}
