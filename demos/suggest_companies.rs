use enrich_api::GraphmobClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = GraphmobClient::from_env().map_err(anyhow::Error::msg)?;

    let response = client.search().suggest_companies(1, "Crisp").await?;
    println!("Search Suggest Companies (raw): {}", response.data);

    Ok(())
}
