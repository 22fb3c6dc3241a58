use enrich_api::{CancelToken, EnrichClient, EnrichError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let email = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "valerian@crisp.chat".to_owned());

    let token = CancelToken::new();
    let client = EnrichClient::from_env()
        .map_err(anyhow::Error::msg)?
        .with_cancel(token.clone());

    // Ctrl-C stops polling between attempts.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    match client.enrich().person_by("email", &email).await {
        Ok(response) => println!("Enrich Person (raw): {}", response.data),
        Err(err @ EnrichError::Exhausted { .. }) => println!("Not found yet: {err}"),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
