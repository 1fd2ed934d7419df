#[tokio::main]
async fn main() -> anyhow::Result<()> {
    oil_price_tracker::run().await
}
