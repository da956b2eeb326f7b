//! # Integration Tests
//!
//! These tests start the dashboard server in-process on an ephemeral port and
//! exercise it over HTTP with `reqwest`. Every upstream (record store, Google
//! Ads, Meta, Google Calendar) is replaced by a `wiremock` server, so no
//! external service or credential is needed.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test integration
//! ```

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clinic_dashboard::config::AppConfig;
    use clinic_dashboard::create_app;
    use clinic_dashboard::state::AppState;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AS_OF: &str = "2026-10-16";

    /// Serve the app on 127.0.0.1 and return its base URL.
    async fn spawn_app(config: AppConfig) -> String {
        let state = AppState::from_config(config).expect("Failed to build app state");
        let app = create_app(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });
        format!("http://{}", addr)
    }

    fn google_ads_config(upstream: &MockServer) -> AppConfig {
        AppConfig {
            google_ads_developer_token: Some("dev-token".to_string()),
            google_ads_api_url: upstream.uri(),
            ..AppConfig::default()
        }
    }

    async fn post_json(url: String, body: Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(url)
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Request builder carrying a signed-in user's headers.
    fn as_user(builder: reqwest::RequestBuilder, user_id: &str) -> reqwest::RequestBuilder {
        builder
            .header("authorization", "Bearer user-token")
            .header("x-user-id", user_id)
    }

    async fn snapshot_of(base: &str, user_id: &str) -> Value {
        let client = reqwest::Client::new();
        let res = as_user(client.get(format!("{}/api/dashboard/snapshot", base)), user_id)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        body["data"].clone()
    }

    // ========================================================================
    // Health and Google Ads proxy
    // ========================================================================

    #[tokio::test]
    async fn test_health_reports_developer_token() {
        let upstream = MockServer::start().await;
        let configured = spawn_app(google_ads_config(&upstream)).await;
        let unconfigured = spawn_app(AppConfig::default()).await;

        let body: Value = reqwest::get(format!("{}/health", configured))
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["developerTokenConfigured"], true);

        let body: Value = reqwest::get(format!("{}/health", unconfigured))
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        assert_eq!(body["developerTokenConfigured"], false);
    }

    #[tokio::test]
    async fn test_proxy_without_developer_token_is_500() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "list_customers", "access_token": "user-token" }),
        )
        .await;

        assert_eq!(res.status(), 500);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert!(body["error"].as_str().unwrap().contains("developer token"));
    }

    #[tokio::test]
    async fn test_proxy_rejects_bad_input() {
        let upstream = MockServer::start().await;
        let base = spawn_app(google_ads_config(&upstream)).await;

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "list_customers" }),
        )
        .await;
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert!(body["error"].as_str().unwrap().contains("access_token"));

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "delete_everything", "access_token": "t" }),
        )
        .await;
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "Unknown action: delete_everything");

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "get_campaigns", "access_token": "t" }),
        )
        .await;
        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn test_proxy_lists_customers() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers:listAccessibleCustomers"))
            .and(header("developer-token", "dev-token"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resourceNames": ["customers/1234567890", "customers/555"]
            })))
            .mount(&upstream)
            .await;
        let base = spawn_app(google_ads_config(&upstream)).await;

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "list_customers", "access_token": "user-token" }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        let customers = body["customers"].as_array().unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0]["id"], "1234567890");
        assert_eq!(customers[0]["resource_name"], "customers/1234567890");
    }

    #[tokio::test]
    async fn test_proxy_gets_campaigns_for_preset() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers/1234567890/googleAds:search"))
            .and(header("developer-token", "dev-token"))
            .and(body_string_contains("DURING LAST_7_DAYS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "campaign": { "id": "111", "name": "Search - Implants", "status": "ENABLED" },
                    "metrics": {
                        "impressions": "4000",
                        "clicks": "100",
                        "costMicros": "2500000",
                        "conversions": 2.0
                    }
                }]
            })))
            .mount(&upstream)
            .await;
        let base = spawn_app(google_ads_config(&upstream)).await;

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({
                "action": "get_campaigns",
                "access_token": "user-token",
                "customer_id": "123-456-7890",
                "date_range": "last_7_days"
            }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        let campaign = &body["campaigns"][0];
        assert_eq!(campaign["id"], "111");
        assert_eq!(campaign["cost_micros"], 2_500_000);
        assert_eq!(campaign["impressions"], 4000);
    }

    #[tokio::test]
    async fn test_proxy_unknown_customer_returns_no_campaigns() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers/999/googleAds:search"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "Request contains an invalid argument.",
                    "details": [{
                        "errors": [{ "errorCode": { "requestError": "CUSTOMER_NOT_FOUND" } }]
                    }]
                }
            })))
            .mount(&upstream)
            .await;
        let base = spawn_app(google_ads_config(&upstream)).await;

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "get_campaigns", "access_token": "t", "customer_id": "999" }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["campaigns"], json!([]));
    }

    #[tokio::test]
    async fn test_proxy_passes_upstream_status_through() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers:listAccessibleCustomers"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "code": 401,
                    "message": "Request had invalid authentication credentials."
                }
            })))
            .mount(&upstream)
            .await;
        let base = spawn_app(google_ads_config(&upstream)).await;

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "list_customers", "access_token": "expired" }),
        )
        .await;

        assert_eq!(res.status(), 401);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("invalid authentication credentials"));
    }

    #[tokio::test]
    async fn test_proxy_non_json_upstream_is_bad_gateway() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers:listAccessibleCustomers"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html>captive portal</html>"),
            )
            .mount(&upstream)
            .await;
        let base = spawn_app(google_ads_config(&upstream)).await;

        let res = post_json(
            format!("{}/api/google-ads", base),
            json!({ "action": "list_customers", "access_token": "t" }),
        )
        .await;

        assert_eq!(res.status(), 502);
        let body: Value = res.json().await.expect("Failed to parse response");
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("status 200"));
        assert!(error.contains("<html>captive portal</html>"));
    }

    // ========================================================================
    // Dashboard metrics
    // ========================================================================

    #[tokio::test]
    async fn test_metrics_without_store_use_sample_data() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/dashboard/metrics", base),
            json!({ "period": "30 days", "asOf": AS_OF }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        let data = &body["data"];
        assert_eq!(data["origins"]["entries"], "fallback");
        assert_eq!(data["origins"]["leads"], "fallback");
        assert_eq!(data["origins"]["appointments"], "fallback");
        assert_eq!(data["range"]["end"], AS_OF);
        assert_eq!(data["range"]["start"], "2026-09-16");
        assert!(data["metrics"]["marketing"]["leadCount"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_metrics_from_store_rows() {
        let store = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/transactions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "t1",
                "date": "2026-10-15",
                "type": "receivable",
                "category": "Consultation",
                "description": "Evaluation",
                "unit_value": "1000",
                "discount": 0,
                "addition": 0,
                "total": "1000",
                "status": "effected"
            }])))
            .mount(&store)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/leads"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "A", "status": "new", "created_at": "2026-10-13T12:00:00Z" },
                {
                    "id": 2,
                    "name": "B",
                    "status": "in_conversation",
                    "created_at": "2026-10-14T12:00:00Z"
                },
                { "id": 3, "name": "C", "status": "sale", "created_at": "2026-10-15T12:00:00Z" }
            ])))
            .mount(&store)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "a",
                    "date": "2026-10-15",
                    "time": "09:00:00",
                    "patient_name": "C",
                    "status": "confirmed"
                },
                {
                    "id": "b",
                    "date": "2026-10-12",
                    "time": "10:30:00",
                    "patient_name": "D",
                    "status": "done"
                }
            ])))
            .mount(&store)
            .await;

        let base = spawn_app(AppConfig {
            store_url: Some(store.uri()),
            store_key: Some("anon-key".to_string()),
            ..AppConfig::default()
        })
        .await;

        let res = post_json(
            format!("{}/api/dashboard/metrics", base),
            json!({ "period": "30 days", "asOf": AS_OF }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        let data = &body["data"];
        assert_eq!(data["origins"]["entries"], "store");
        assert_eq!(data["origins"]["leads"], "store");

        let metrics = &data["metrics"];
        assert_eq!(metrics["marketing"]["grossRevenue"], 1000.0);
        assert_eq!(metrics["marketing"]["marketingInvestment"], 45.0);
        assert_eq!(metrics["marketing"]["marketingEstimated"], true);
        assert_eq!(metrics["sales"]["scheduled"], 2);
        assert_eq!(metrics["sales"]["attended"], 1);
        assert_eq!(metrics["sales"]["cac"], 22.5);
        assert_eq!(metrics["financial"]["netProfit"], 955.0);
        let roi = metrics["financial"]["roi"].as_f64().unwrap();
        assert!((roi - 2122.2).abs() < 0.1);
    }

    #[tokio::test]
    async fn test_metrics_merge_calendar_events() {
        let calendar = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer cal-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {
                        "id": "e1",
                        "summary": "Follow-up",
                        "start": { "dateTime": "2026-10-14T15:00:00-03:00" }
                    },
                    { "id": "e2", "summary": "Clinic closed", "start": { "date": "2026-10-12" } },
                    {
                        "id": "e3",
                        "summary": "After hours",
                        "start": { "dateTime": "2026-10-16T21:30:00-03:00" }
                    }
                ]
            })))
            .mount(&calendar)
            .await;

        let base = spawn_app(AppConfig {
            google_calendar_url: calendar.uri(),
            ..AppConfig::default()
        })
        .await;

        let res = post_json(
            format!("{}/api/dashboard/metrics", base),
            json!({ "period": "7 days", "asOf": AS_OF, "calendarToken": "cal-token" }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["origins"]["calendarEvents"], 3);
    }

    #[tokio::test]
    async fn test_metrics_survive_calendar_failure() {
        let calendar = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&calendar)
            .await;

        let base = spawn_app(AppConfig {
            google_calendar_url: calendar.uri(),
            ..AppConfig::default()
        })
        .await;

        let res = post_json(
            format!("{}/api/dashboard/metrics", base),
            json!({ "asOf": AS_OF, "calendarToken": "expired" }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["origins"]["calendarEvents"], 0);
        assert_eq!(body["data"]["range"]["label"], "30 days");
    }

    // ========================================================================
    // Campaigns
    // ========================================================================

    #[tokio::test]
    async fn test_campaigns_demo_mode_without_connections() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/dashboard/campaigns", base),
            json!({ "asOf": AS_OF }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["mode"], "demo");
        assert!(!body["data"]["campaigns"].as_array().unwrap().is_empty());
        assert_eq!(body["message"], "Demo campaigns: no ad platform connected");
    }

    #[tokio::test]
    async fn test_campaigns_connected_platform_failure_is_empty_not_demo() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/customers/42/googleAds:search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&upstream)
            .await;
        let base = spawn_app(google_ads_config(&upstream)).await;

        let res = post_json(
            format!("{}/api/dashboard/campaigns", base),
            json!({
                "asOf": AS_OF,
                "googleAds": { "accessToken": "t", "customerId": "42" }
            }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["mode"], "live");
        assert_eq!(body["data"]["campaigns"], json!([]));
        assert_eq!(body["data"]["totals"]["spend"], 0.0);
    }

    #[tokio::test]
    async fn test_campaigns_from_meta_and_google() {
        let upstream = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/act_777/insights"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "campaign_id": "m1",
                    "campaign_name": "Lead form",
                    "spend": "100.00",
                    "impressions": "10000",
                    "clicks": "200",
                    "actions": [
                        { "action_type": "link_click", "value": "200" },
                        { "action_type": "lead", "value": "4" }
                    ]
                }]
            })))
            .mount(&upstream)
            .await;
        Mock::given(method("POST"))
            .and(path("/customers/42/googleAds:search"))
            .and(body_string_contains("BETWEEN '2026-09-16' AND '2026-10-16'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "campaign": { "id": "g1", "name": "Search", "status": "ENABLED" },
                    "metrics": {
                        "impressions": "4000",
                        "clicks": "100",
                        "costMicros": "50000000",
                        "conversions": 3.5
                    }
                }]
            })))
            .mount(&upstream)
            .await;

        let base = spawn_app(AppConfig {
            meta_graph_url: upstream.uri(),
            ..google_ads_config(&upstream)
        })
        .await;

        let res = post_json(
            format!("{}/api/dashboard/campaigns", base),
            json!({
                "period": "30 days",
                "asOf": AS_OF,
                "meta": { "accessToken": "meta-token", "adAccountId": "act_777" },
                "googleAds": { "accessToken": "g-token", "customerId": "42" }
            }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        let data = &body["data"];
        assert_eq!(data["mode"], "live");
        assert_eq!(data["campaigns"].as_array().unwrap().len(), 2);
        assert_eq!(data["totals"]["spend"], 150.0);
        assert_eq!(data["totals"]["leads"], 7.5);
        assert_eq!(data["totals"]["cpl"], 20.0);
    }

    // ========================================================================
    // Record writes
    // ========================================================================

    fn lead_json(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "name": "Maria",
            "phone": "",
            "status": status,
            "temperature": "hot",
            "lastMessage": "",
            "potentialValue": 900.0,
            "createdAt": "2026-10-10T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_stage_change_to_sale_proposes_entry() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/leads/l1/stage", base),
            json!({ "lead": lead_json("l1", "scheduled"), "to": "sale", "ticketValue": 600.0 }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        let data = &body["data"];
        assert_eq!(data["lead"]["status"], "sale");
        assert_eq!(data["event"]["from"], "scheduled");
        assert_eq!(data["event"]["to"], "sale");
        assert_eq!(data["proposal"]["leadId"], "l1");
        assert_eq!(data["proposal"]["draft"]["type"], "receivable");
        assert_eq!(data["proposal"]["draft"]["unitValue"], 600.0);
    }

    #[tokio::test]
    async fn test_stage_change_without_sale_has_no_proposal() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/leads/l1/stage", base),
            json!({ "lead": lead_json("l1", "new"), "to": "in_conversation" }),
        )
        .await;

        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("Failed to parse response");
        assert!(body["data"]["proposal"].is_null());
        assert_eq!(body["data"]["event"]["to"], "in_conversation");
    }

    #[tokio::test]
    async fn test_stage_change_id_mismatch_is_400() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/leads/other/stage", base),
            json!({ "lead": lead_json("l1", "new"), "to": "sale" }),
        )
        .await;
        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn test_create_entry_derives_total() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/entries", base),
            json!({
                "draft": {
                    "date": AS_OF,
                    "type": "receivable",
                    "category": "Procedure",
                    "name": "Whitening",
                    "unitValue": 1000.0,
                    "discount": 150.0,
                    "addition": 25.0,
                    "status": "effected"
                }
            }),
        )
        .await;

        assert_eq!(res.status(), 201, "Expected 201 Created");
        let body: Value = res.json().await.expect("Failed to parse response");
        assert_eq!(body["data"]["total"], 875.0);
        assert!(!body["data"]["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_entry_rejects_negative_values() {
        let base = spawn_app(AppConfig::default()).await;
        let res = post_json(
            format!("{}/api/entries", base),
            json!({
                "draft": {
                    "date": AS_OF,
                    "type": "payable",
                    "category": "Rent",
                    "name": "Rent",
                    "unitValue": -10.0,
                    "status": "effected"
                }
            }),
        )
        .await;
        assert_eq!(res.status(), 400);
    }

    // ========================================================================
    // Session snapshots
    // ========================================================================

    fn entry_draft(name: &str) -> Value {
        json!({
            "draft": {
                "date": AS_OF,
                "type": "receivable",
                "category": "Procedure",
                "name": name,
                "unitValue": 400.0,
                "status": "effected"
            }
        })
    }

    #[tokio::test]
    async fn test_snapshot_tracks_created_and_deleted_entries() {
        let base = spawn_app(AppConfig::default()).await;
        let client = reqwest::Client::new();

        let res = as_user(client.post(format!("{}/api/entries", base)), "u1")
            .json(&entry_draft("Botox"))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.expect("Failed to parse response");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let snapshot = snapshot_of(&base, "u1").await;
        assert_eq!(snapshot["entries"][0]["id"], id.as_str());
        assert!(snapshot_of(&base, "u2").await["entries"]
            .as_array()
            .unwrap()
            .is_empty());

        let res = as_user(client.delete(format!("{}/api/entries/{}", base, id)), "u1")
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 204);
        let snapshot = snapshot_of(&base, "u1").await;
        assert!(snapshot["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stage_change_updates_session_snapshot() {
        let base = spawn_app(AppConfig::default()).await;
        let client = reqwest::Client::new();

        let res = as_user(client.post(format!("{}/api/leads/l9/stage", base)), "u1")
            .json(&json!({ "lead": lead_json("l9", "scheduled"), "to": "sale" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 200);

        let snapshot = snapshot_of(&base, "u1").await;
        assert_eq!(snapshot["leads"][0]["id"], "l9");
        assert_eq!(snapshot["leads"][0]["status"], "sale");
    }

    #[tokio::test]
    async fn test_delete_entry_reaches_store() {
        let store = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/transactions"))
            .and(query_param("id", "eq.abc"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&store)
            .await;
        let base = spawn_app(AppConfig {
            store_url: Some(store.uri()),
            store_key: Some("anon-key".to_string()),
            ..AppConfig::default()
        })
        .await;

        let res = reqwest::Client::new()
            .delete(format!("{}/api/entries/abc", base))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 204);

        // The store write runs after the response.
        let mut deleted = false;
        for _ in 0..100 {
            let requests = store.received_requests().await.unwrap_or_default();
            if requests.iter().any(|r| r.method.as_str() == "DELETE") {
                deleted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(deleted, "Expected a DELETE against the store");
    }

    #[tokio::test]
    async fn test_delete_sample_entry_skips_store() {
        let store = MockServer::start().await;
        let base = spawn_app(AppConfig {
            store_url: Some(store.uri()),
            store_key: Some("anon-key".to_string()),
            ..AppConfig::default()
        })
        .await;

        let res = reqwest::Client::new()
            .delete(format!("{}/api/entries/sample-entry-1", base))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(res.status(), 204);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let requests = store.received_requests().await.unwrap_or_default();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn test_superseded_metrics_refresh_is_flagged_stale() {
        let calendar = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "items": [] }))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&calendar)
            .await;
        let base = spawn_app(AppConfig {
            google_calendar_url: calendar.uri(),
            ..AppConfig::default()
        })
        .await;

        let slow_url = format!("{}/api/dashboard/metrics", base);
        let slow = tokio::spawn(async move {
            post_json(slow_url, json!({ "asOf": AS_OF, "calendarToken": "slow" })).await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let fast = post_json(
            format!("{}/api/dashboard/metrics", base),
            json!({ "asOf": AS_OF, "period": "7 days" }),
        )
        .await;
        let fast: Value = fast.json().await.expect("Failed to parse response");
        assert_eq!(fast["data"]["stale"], false);

        let slow = slow.await.expect("Slow request panicked");
        assert_eq!(slow.status(), 200);
        let slow: Value = slow.json().await.expect("Failed to parse response");
        assert_eq!(slow["data"]["stale"], true);
        assert_eq!(slow["message"], "Metrics consolidated from a superseded refresh");
    }
}
