//! Integration tests for pmodjradio

use pmodjradio::{DjRadioClient, Error};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RADIO_ID: &str = "336355127";

/// Channel metadata as embedded in the first page
fn radio_data(program_count: u64) -> serde_json::Value {
    json!({
        "id": 336355127u64,
        "name": "深夜电台",
        "dj": { "nickname": "夜行者" },
        "category": "情感调频",
        "createTime": 1546272000000i64,
        "subCount": 1024,
        "programCount": program_count,
        "lastProgramCreateTime": 1549036800000i64,
        "shareCount": 88,
        "rcmdText": null
    })
}

/// Listing rows for programs `first..first + count`
fn rows(first: u32, count: u32) -> String {
    (first..first + count)
        .map(|i| {
            format!(
                r#"<tr id="songlist-{i}" class="">
<td><div><span class="num">{i}</span></div></td>
<td><div class="tt"><a href="/program?id={i}" title="Program {i}">Program {i}</a></div></td>
<td><span>播放{i}</span></td>
<td><span>赞1</span></td>
<td><span>2019-1-25</span></td>
<td><span>1:{sec:02}</span></td>
</tr>"#,
                sec = i % 60
            )
        })
        .collect()
}

fn page(metadata: Option<serde_json::Value>, rows: String) -> String {
    let textarea = metadata
        .map(|m| format!(r#"<textarea id="radio-data">{}</textarea>"#, m))
        .unwrap_or_default();
    format!("<html><body>{textarea}<table><tbody>{rows}</tbody></table></body></html>")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, offset: u64, body: String, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/djradio"))
        .and(query_param("id", RADIO_ID))
        .and(query_param("order", "2"))
        .and(query_param("limit", "500"))
        .and(query_param("offset", offset.to_string()))
        .respond_with(html(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn client_for(server: &MockServer) -> DjRadioClient {
    DjRadioClient::builder()
        .base_url(format!("{}/djradio", server.uri()))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_small_channel_needs_one_fetch() {
    let server = MockServer::start().await;
    mount_page(&server, 0, page(Some(radio_data(3)), rows(1, 3)), 1).await;
    mount_page(&server, 500, page(None, String::new()), 0).await;

    let channel = client_for(&server)
        .await
        .fetch_channel(RADIO_ID)
        .await
        .unwrap()
        .expect("channel exists");

    assert_eq!(channel.info.program_count, 3);
    assert_eq!(channel.info.host_name(), "夜行者");
    assert_eq!(channel.programs.len(), 3);
    assert_eq!(channel.programs[2].title, "Program 3");
}

#[tokio::test]
async fn test_exactly_500_programs_is_one_page() {
    let server = MockServer::start().await;
    mount_page(&server, 0, page(Some(radio_data(500)), rows(1, 500)), 1).await;
    mount_page(&server, 500, page(None, String::new()), 0).await;

    let channel = client_for(&server)
        .await
        .fetch_channel(RADIO_ID)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(channel.programs.len(), 500);
}

#[tokio::test]
async fn test_1200_programs_fetch_three_pages_in_order() {
    let server = MockServer::start().await;
    mount_page(&server, 0, page(Some(radio_data(1200)), rows(1, 500)), 1).await;
    // Later pages carry metadata too; only the first page's copy is used
    mount_page(&server, 500, page(Some(radio_data(1200)), rows(501, 500)), 1).await;
    mount_page(&server, 1000, page(Some(radio_data(1200)), rows(1001, 200)), 1).await;
    mount_page(&server, 1500, page(None, String::new()), 0).await;

    let channel = client_for(&server)
        .await
        .fetch_channel(RADIO_ID)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(channel.programs.len(), 1200);
    let indexes: Vec<u32> = channel.programs.iter().map(|p| p.index).collect();
    assert_eq!(indexes, (1..=1200).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_zero_programs() {
    let server = MockServer::start().await;
    mount_page(&server, 0, page(Some(radio_data(0)), String::new()), 1).await;

    let channel = client_for(&server)
        .await
        .fetch_channel(RADIO_ID)
        .await
        .unwrap()
        .unwrap();
    assert!(channel.programs.is_empty());
}

#[tokio::test]
async fn test_missing_metadata_means_channel_not_found() {
    let server = MockServer::start().await;
    mount_page(&server, 0, page(None, rows(1, 2)), 1).await;

    let channel = client_for(&server)
        .await
        .fetch_channel(RADIO_ID)
        .await
        .unwrap();
    assert!(channel.is_none());
}

#[tokio::test]
async fn test_non_200_first_page_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/djradio"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .fetch_channel(RADIO_ID)
        .await
        .unwrap_err();

    match err {
        Error::Fetch { url, status } => {
            assert_eq!(status, 503);
            assert!(url.contains("offset=0"));
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_200_later_page_discards_everything() {
    let server = MockServer::start().await;
    mount_page(&server, 0, page(Some(radio_data(1200)), rows(1, 500)), 1).await;
    Mock::given(method("GET"))
        .and(path("/djradio"))
        .and(query_param("offset", "500"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    // Not retried, and no page after the failure
    mount_page(&server, 1000, page(None, rows(1001, 200)), 0).await;

    let result = client_for(&server).await.fetch_channel(RADIO_ID).await;
    match result {
        Err(Error::Fetch { url, status }) => {
            assert_eq!(status, 404);
            assert!(url.contains("offset=500"));
        }
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_row_fails_the_listing() {
    let server = MockServer::start().await;
    let broken = rows(1, 2).replace("1:02", "soon");
    mount_page(&server, 0, page(Some(radio_data(2)), broken), 1).await;

    let result = client_for(&server).await.fetch_channel(RADIO_ID).await;
    assert!(matches!(result, Err(Error::Parse { row: Some(1), .. })));
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/djradio"))
        .and(wiremock::matchers::header("user-agent", "pmodjradio-test"))
        .respond_with(html(page(Some(radio_data(1)), rows(1, 1))))
        .expect(1)
        .mount(&server)
        .await;

    let client = DjRadioClient::builder()
        .base_url(format!("{}/djradio", server.uri()))
        .user_agent("pmodjradio-test")
        .build()
        .await
        .unwrap();

    let channel = client.fetch_channel(RADIO_ID).await.unwrap().unwrap();
    assert_eq!(channel.programs.len(), 1);
}

#[tokio::test]
async fn test_duplicate_indexes_across_pages_are_kept() {
    let server = MockServer::start().await;
    mount_page(&server, 0, page(Some(radio_data(502)), rows(1, 500)), 1).await;
    // The second page repeats the last episode of the first one
    mount_page(&server, 500, page(None, rows(500, 2)), 1).await;

    let channel = client_for(&server)
        .await
        .fetch_channel(RADIO_ID)
        .await
        .unwrap()
        .unwrap();

    let indexes: Vec<u32> = channel.programs.iter().map(|p| p.index).collect();
    assert_eq!(indexes.len(), 502);
    assert_eq!(&indexes[498..], &[499, 500, 500, 501]);
}
