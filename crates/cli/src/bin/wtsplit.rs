use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    wtsplit_cli::main_entry().await
}
