use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    taxy_cli::cli::app::run().await
}
