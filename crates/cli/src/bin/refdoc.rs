use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    refdoc_cli::main_entry().await
}
