/// Graph API client tests against a mocked Graph host
/// Exercises authentication params, create/update paths and failure handling
use rust_fb_ads_api::errors::AppError;
use rust_fb_ads_api::graph_client::{appsecret_proof, GraphClient};
use rust_fb_ads_api::models::{AdRequest, AdSetRecord, CampaignRequest, EntityStatus};
use rust_fb_ads_api::normalizer::{validate_and_normalize_ad, validate_and_normalize_campaign};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a client pointed at the mock server
fn create_test_client(base_url: String, app_secret: Option<&str>) -> GraphClient {
    GraphClient::new(
        base_url,
        "v19.0".to_string(),
        "test-token".to_string(),
        app_secret,
    )
    .unwrap()
}

fn test_campaign() -> rust_fb_ads_api::normalizer::NormalizedCampaign {
    let request: CampaignRequest = serde_json::from_value(json!({
        "name": "Spring Sale",
        "objective": "OUTCOME_SALES",
        "facebookAdAccountId": "1001",
        "dailyBudget": 5000
    }))
    .unwrap();
    validate_and_normalize_campaign(&request).unwrap()
}

#[tokio::test]
async fn test_create_campaign_posts_normalized_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/act_1001/campaigns"))
        .and(query_param("access_token", "test-token"))
        .and(body_json(json!({
            "name": "Spring Sale",
            "objective": "OUTCOME_SALES",
            "status": "PAUSED",
            "special_ad_categories": [],
            "daily_budget": "5000"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "120200000000001" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    let id = client.create_campaign(&test_campaign()).await.unwrap();

    assert_eq!(id, "120200000000001");
}

#[tokio::test]
async fn test_appsecret_proof_is_sent_when_configured() {
    let mock_server = MockServer::start().await;
    let proof = appsecret_proof("app-secret", "test-token").unwrap();

    Mock::given(method("POST"))
        .and(path("/v19.0/act_1001/campaigns"))
        .and(query_param("appsecret_proof", proof.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 120200000000002u64 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), Some("app-secret"));
    let id = client.create_campaign(&test_campaign()).await.unwrap();

    // Numeric ids in the response are accepted too
    assert_eq!(id, "120200000000002");
}

#[tokio::test]
async fn test_create_ad_sends_numeric_identifiers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/act_1001/ads"))
        .and(body_json(json!({
            "name": "Test Ad",
            "adset_id": 987654321u64,
            "creative": { "creative_id": 123456789u64 },
            "status": "PAUSED"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "120210000000009" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request: AdRequest = serde_json::from_value(json!({
        "name": "Test Ad",
        "adsetId": "507f1f77bcf86cd799439011",
        "creativeId": "123456789",
        "status": "PAUSED"
    }))
    .unwrap();
    let record: AdSetRecord = serde_json::from_value(json!({
        "_id": "507f1f77bcf86cd799439011",
        "facebookAdsetId": "987654321",
        "facebookAdAccountId": "act_1001"
    }))
    .unwrap();
    let body = validate_and_normalize_ad(&request, Some(&record)).unwrap();

    let client = create_test_client(mock_server.uri(), None);
    let id = client
        .create_ad(&record.facebook_ad_account_id, &body)
        .await
        .unwrap();

    assert_eq!(id, "120210000000009");
}

#[tokio::test]
async fn test_graph_error_envelope_becomes_external_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/act_1001/campaigns"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Invalid parameter",
                "type": "OAuthException",
                "code": 100,
                "fbtrace_id": "AXyz"
            }
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    let err = client.create_campaign(&test_campaign()).await.unwrap_err();

    match err {
        AppError::ExternalApiError(msg) => {
            assert!(msg.contains("Invalid parameter"));
            assert!(msg.contains("code 100"));
        }
        other => panic!("Expected ExternalApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_id_in_create_response_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/act_1001/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    let result = client.create_campaign(&test_campaign()).await;

    assert!(matches!(result, Err(AppError::ExternalApiError(_))));
}

#[tokio::test]
async fn test_set_status_posts_to_object_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/120200000000001"))
        .and(body_json(json!({ "status": "ARCHIVED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    client
        .set_status("120200000000001", EntityStatus::Archived)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_reporting_failure_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/120200000000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    let result = client
        .update_object("120200000000001", &json!({ "name": "Renamed" }))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_server_errors_open_the_circuit() {
    let mock_server = MockServer::start().await;

    // Only the first five calls reach Facebook
    Mock::given(method("POST"))
        .and(path("/v19.0/act_1001/campaigns"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
        .expect(5)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    let campaign = test_campaign();

    for _ in 0..5 {
        assert!(client.create_campaign(&campaign).await.is_err());
    }

    match client.create_campaign(&campaign).await {
        Err(AppError::ExternalApiError(msg)) => assert!(msg.contains("circuit open")),
        other => panic!("Expected circuit to reject the call, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_errors_do_not_open_the_circuit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/act_1001/campaigns"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Invalid parameter", "code": 100 }
        })))
        .expect(7)
        .mount(&mock_server)
        .await;

    let client = create_test_client(mock_server.uri(), None);
    let campaign = test_campaign();

    for _ in 0..7 {
        match client.create_campaign(&campaign).await {
            Err(AppError::ExternalApiError(msg)) => assert!(!msg.contains("circuit open")),
            other => panic!("Expected Graph error, got {:?}", other),
        }
    }
}
