//! Integration tests for page-based listing traversal using wiremock

mod common;

use common::{api_config, controlled_transport};
use futures::TryStreamExt;
use gh_org_stats::facts::{FetchError, paginate};
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PER_PAGE: u32 = 3;

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Item {
    id: u32,
}

fn items(range: core::ops::Range<u32>) -> Value {
    Value::Array(range.map(|id| json!({ "id": id })).collect())
}

async fn mount_page(server: &MockServer, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("per_page", PER_PAGE.to_string()))
        .and(query_param("page", page.to_string()))
        .and(query_param("kind", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn collect_ids(server: &MockServer) -> Result<Vec<u32>, FetchError> {
    let (transport, _clock) = controlled_transport(api_config(server));
    let url = Url::parse(&format!("{}/items", server.uri())).unwrap();
    let params = [("kind", "all".to_string())];

    let items: Vec<Item> = paginate::<Item>(&transport, &url, &params, PER_PAGE).try_collect().await?;
    Ok(items.into_iter().map(|i| i.id).collect())
}

#[tokio::test]
async fn test_empty_listing_makes_one_request() {
    let server = MockServer::start().await;
    mount_page(&server, 1, items(0..0)).await;

    assert!(collect_ids(&server).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_exactly_one_full_page() {
    let server = MockServer::start().await;
    mount_page(&server, 1, items(0..3)).await;
    mount_page(&server, 2, items(0..0)).await;

    assert_eq!(collect_ids(&server).await.unwrap(), [0, 1, 2]);
}

#[tokio::test]
async fn test_short_last_page_stops_without_extra_request() {
    let server = MockServer::start().await;
    mount_page(&server, 1, items(0..3)).await;
    mount_page(&server, 2, items(3..4)).await;

    assert_eq!(collect_ids(&server).await.unwrap(), [0, 1, 2, 3]);
}

#[tokio::test]
async fn test_two_full_pages() {
    let server = MockServer::start().await;
    mount_page(&server, 1, items(0..3)).await;
    mount_page(&server, 2, items(3..6)).await;
    mount_page(&server, 3, items(0..0)).await;

    assert_eq!(collect_ids(&server).await.unwrap(), [0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_non_list_page_ends_listing() {
    let server = MockServer::start().await;
    mount_page(&server, 1, items(0..3)).await;
    mount_page(&server, 2, json!({ "message": "unexpected" })).await;

    assert_eq!(collect_ids(&server).await.unwrap(), [0, 1, 2]);
}

#[tokio::test]
async fn test_missing_listing_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    assert!(collect_ids(&server).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_undecodable_item_is_malformed() {
    let server = MockServer::start().await;
    mount_page(&server, 1, json!([{ "id": 1 }, { "id": "two" }])).await;

    let err = collect_ids(&server).await.unwrap_err();
    assert!(err.is_malformed(), "{err}");
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let server = MockServer::start().await;
    mount_page(&server, 1, items(0..3)).await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(3..6)))
        .expect(0)
        .mount(&server)
        .await;

    let (transport, _clock) = controlled_transport(api_config(&server));
    let url = Url::parse(&format!("{}/items", server.uri())).unwrap();
    let params = [("kind", "all".to_string())];

    let mut stream = core::pin::pin!(paginate::<Item>(&transport, &url, &params, PER_PAGE));
    let first = stream.try_next().await.unwrap();
    assert_eq!(first, Some(Item { id: 0 }));
}

fn link_to(server: &MockServer, rels: &[(&str, u32)]) -> String {
    rels.iter()
        .map(|(rel, page)| format!(r#"<{}/items?per_page={PER_PAGE}&page={page}>; rel="{rel}""#, server.uri()))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn mount_linked_page(server: &MockServer, page: u32, body: Value, link: String) {
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).insert_header("link", link.as_str()))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_page_without_next_link_ends_listing() {
    let server = MockServer::start().await;
    let link = link_to(&server, &[("first", 1), ("prev", 1)]);
    mount_linked_page(&server, 2, items(3..6), link).await;
    let link = link_to(&server, &[("next", 2), ("last", 2)]);
    mount_linked_page(&server, 1, items(0..3), link).await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(items(0..0)))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(collect_ids(&server).await.unwrap(), [0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_next_link_picks_following_page() {
    let server = MockServer::start().await;
    let link = link_to(&server, &[("next", 5), ("last", 5)]);
    mount_linked_page(&server, 1, items(0..3), link).await;
    mount_linked_page(&server, 5, items(9..10), String::new()).await;

    assert_eq!(collect_ids(&server).await.unwrap(), [0, 1, 2, 9]);
}
