use super::*;
use crate::store::{MemoryStore, Table};
use crate::testing::{RecordingMessenger, StaticFetcher, TaggingEnricher};
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

const FEED: &str = r#"<rss><channel>
<item>
  <title>Căn hộ Thủ Thiêm tăng giá</title>
  <link>https://vnexpress.net/a-1.html</link>
  <description>Giá căn hộ tăng mạnh.</description>
</item>
<item>
  <title>Thị trường nhà phố</title>
  <link>https://vnexpress.net/b-2.html</link>
  <description>Nguồn cung thấp.</description>
</item>
</channel></rss>"#;

struct Harness {
    store: Arc<MemoryStore>,
    messenger: Arc<RecordingMessenger>,
    router: Router,
}

fn harness(store: MemoryStore) -> Harness {
    let store = Arc::new(store);
    let messenger = Arc::new(RecordingMessenger::new());
    let fetcher = StaticFetcher::new()
        .with_page(crate::pipeline::news::DEFAULT_FEED_URL, FEED)
        .with_page(
            "https://listings.example.com/villa-9",
            r#"<html><head><meta property="og:title" content="Villa for sale in Arabian Ranches"></head>
               <body><p>Price: 6,800,000 AED</p><p>4 bedrooms, 5 bathrooms</p></body></html>"#,
        );
    let state = AppState::assemble(
        store.clone(),
        Arc::new(fetcher),
        Arc::new(TaggingEnricher),
        false,
        Some(messenger.clone() as Arc<dyn Messenger>),
        Some("@estate_news"),
    );
    Harness {
        store,
        messenger,
        router: build_router(state),
    }
}

async fn post(router: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness(MemoryStore::new());
    let response = h
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn extract_returns_structured_listing() {
    let h = harness(MemoryStore::new());
    let (status, body) = post(
        &h.router,
        "/functions/property-scraper",
        json!({
            "action": "extract",
            "text": "🏢 Studio for rent in Dubai Marina\n💰 Price: 45,000 AED\n📞 Contact: +971 50 123 4567"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["saved"], false);
    let property = &body["property"];
    assert_eq!(property["property_type"], "Studio");
    assert_eq!(property["purpose"], "rent");
    assert_eq!(property["location_area"], "Dubai Marina");
    assert_eq!(property["price"], 45000);
    assert_eq!(property["agent_phone"], "+971 50 123 4567");
    assert_eq!(h.store.count(Table::ScrapedProperties), 0);
}

#[tokio::test]
async fn non_listing_text_is_not_an_error() {
    let h = harness(MemoryStore::new());
    let (status, body) = post(
        &h.router,
        "/functions/property-scraper",
        json!({"action": "extract", "text": "Happy new year everyone!"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["property"].is_null());
}

#[tokio::test]
async fn scrape_url_saves_once() {
    let h = harness(MemoryStore::new());
    let request = json!({"action": "scrape_url", "url": "https://listings.example.com/villa-9", "save": true});

    let (_, first) = post(&h.router, "/functions/property-scraper", request.clone()).await;
    let (_, second) = post(&h.router, "/functions/property-scraper", request).await;

    assert_eq!(first["saved"], true);
    assert_eq!(first["property"]["price"], 6_800_000);
    assert_eq!(second["duplicate"], true);
    assert_eq!(h.store.count(Table::ScrapedProperties), 1);
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let h = harness(MemoryStore::new());

    let (status, body) = post(&h.router, "/functions/property-scraper", json!({"action": "extract"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "text is required");

    let (status, body) = post(&h.router, "/functions/web-scraper", json!({"action": "dance"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown action: dance");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let h = harness(MemoryStore::new());

    let (status, body) = post(&h.router, "/functions/web-scraper", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("missing field `action`"));

    let (status, body) = post(&h.router, "/functions/ai-assistant", json!({"message": 5})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let response = h
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/functions/property-scraper")
                .body(Body::from("action=extract"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn scrape_source_reports_failure_for_unreachable_source() {
    let h = harness(MemoryStore::new().with_rows(
        Table::DataSources,
        vec![json!({"id": "src-9", "name": "Down", "url": "https://down.example.com", "source_type": "website"})],
    ));

    let (status, body) = post(
        &h.router,
        "/functions/web-scraper",
        json!({"action": "scrape_source", "source_id": "src-9"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("404"));
    assert_eq!(body["job"]["status"], "failed");

    let (_, jobs) = post(&h.router, "/functions/web-scraper", json!({"action": "jobs"})).await;
    assert_eq!(jobs["jobs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_source_is_not_found() {
    let h = harness(MemoryStore::new());
    let (status, body) = post(
        &h.router,
        "/functions/web-scraper",
        json!({"action": "scrape_source", "source_id": "nope"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn news_fetch_skips_stored_links() {
    let h = harness(MemoryStore::new().with_rows(
        Table::NewsArticles,
        vec![json!({"original_url": "https://vnexpress.net/a-1.html"})],
    ));

    let (status, body) = post(
        &h.router,
        "/functions/parse-vnexpress",
        json!({"action": "fetch_and_translate"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["fetched"], 2);
    assert_eq!(body["saved"], 1);
}

#[tokio::test]
async fn news_publish_posts_to_channel() {
    let h = harness(MemoryStore::new());
    post(&h.router, "/functions/parse-vnexpress", json!({})).await;

    let (_, body) = post(
        &h.router,
        "/functions/parse-vnexpress",
        json!({"action": "publish", "limit": 1}),
    )
    .await;

    assert_eq!(body["published"], 1);
    assert_eq!(h.store.count(Table::ChannelPosts), 1);
    assert_eq!(h.messenger.sent().len(), 1);
}

#[tokio::test]
async fn assistant_translates() {
    let h = harness(MemoryStore::new());
    let (_, body) = post(
        &h.router,
        "/functions/ai-assistant",
        json!({"message": "Căn hộ 2 phòng ngủ", "type": "translate"}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Căn hộ 2 phòng ngủ [translate]");
    assert_eq!(body["degraded"], false);
}

#[tokio::test]
async fn telegram_webhook_always_acknowledges() {
    let h = harness(MemoryStore::new());

    let (status, body) = post(&h.router, "/functions/telegram-bot", json!({"unexpected": true})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = post(
        &h.router,
        "/functions/telegram-bot",
        json!({
            "update_id": 1,
            "message": {
                "message_id": 1,
                "date": 1714550400,
                "chat": {"id": 5, "type": "private", "first_name": "Mai"},
                "from": {"id": 5, "is_bot": false, "first_name": "Mai"},
                "text": "/help"
            }
        }),
    )
    .await;
    assert_eq!(body["success"], true);
    assert!(h.messenger.texts()[0].contains("Commands"));
}

#[tokio::test]
async fn telegram_setup_needs_a_token() {
    let h = harness(MemoryStore::new());
    let (status, body) = post(&h.router, "/functions/telegram-setup", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "TELEGRAM_BOT_TOKEN is not set");
}
