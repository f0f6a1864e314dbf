#[tokio::main]
async fn main() -> std::io::Result<()> {
    arena_server::run_with_config().await
}
