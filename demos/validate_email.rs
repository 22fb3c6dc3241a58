use enrich_api::EnrichClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = EnrichClient::from_env().map_err(anyhow::Error::msg)?;

    let response = client.verify().validate_email("valerian@crisp.chat").await?;
    println!("Verify Validate Email (raw): {}", response.data);

    Ok(())
}
