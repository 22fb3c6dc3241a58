//! Runs against the real APIs when credentials are available.
//!
//! Set `ENRICH_API_USER_ID` / `ENRICH_API_SECRET_KEY` (and optionally
//! `GRAPHMOB_API_USER_ID` / `GRAPHMOB_API_SECRET_KEY`); without them each test
//! returns early.

use enrich_api::{EnrichClient, EnrichError, GraphmobClient};

fn live_enrich_client() -> Option<EnrichClient> {
    match EnrichClient::from_env() {
        Ok(client) => Some(client),
        Err(reason) => {
            eprintln!("skipping live Enrich test: {reason}");
            None
        }
    }
}

fn live_graphmob_client() -> Option<GraphmobClient> {
    match GraphmobClient::from_env() {
        Ok(client) => Some(client),
        Err(reason) => {
            eprintln!("skipping live Graphmob test: {reason}");
            None
        }
    }
}

#[tokio::test]
async fn live_validate_email() {
    let Some(client) = live_enrich_client() else {
        return;
    };

    let response = client
        .verify()
        .validate_email("valerian@crisp.chat")
        .await
        .expect("live validation must succeed");

    assert!(response.status().is_success());
    assert!(response.data.valid.is_some());
}

#[tokio::test]
async fn live_enrich_person_resolves_or_reports_not_found() {
    let Some(client) = live_enrich_client() else {
        return;
    };

    match client
        .enrich()
        .person_by("email", "valerian@crisp.chat")
        .await
    {
        Ok(response) => assert!(response.status().is_success()),
        Err(err @ (EnrichError::Exhausted { .. } | EnrichError::Api { .. })) => {
            assert!(err.reason().is_some(), "unexpected error: {err}");
        }
        Err(err) => panic!("unexpected live error: {err}"),
    }
}

#[tokio::test]
async fn live_suggest_companies() {
    let Some(client) = live_graphmob_client() else {
        return;
    };

    let response = client
        .search()
        .suggest_companies(1, "Crisp")
        .await
        .expect("live suggestion must succeed");

    assert!(response.status().is_success());
}
