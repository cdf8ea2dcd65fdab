use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    ctc_cli::main_entry().await
}
