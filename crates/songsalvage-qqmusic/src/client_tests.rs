// SPDX-License-Identifier: GPL-3.0-or-later

#[cfg(test)]
mod tests {
    use crate::{QqMusicClient, QqMusicError, SearchQuery};
    use songsalvage_domain::NormalizedQuery;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_PATH: &str = "/soso/fcgi-bin/client_search_cp";

    fn sunny_day_response() -> serde_json::Value {
        serde_json::json!({
            "code": 0,
            "data": {
                "song": {
                    "curnum": 1,
                    "curpage": 1,
                    "list": [{
                        "songname": "晴天",
                        "singer": [{ "id": 4558, "mid": "0025NhlN2yWrP4", "name": "周杰伦" }],
                        "songmid": "0039MnYb0qxYhV",
                        "albumname": "叶惠美"
                    }],
                    "totalnum": 1
                }
            }
        })
    }

    fn client_for(server: &MockServer) -> QqMusicClient {
        QqMusicClient::builder()
            .base_url(format!("{}{}", server.uri(), SEARCH_PATH))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_search_songs_sends_expected_parameters() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .and(query_param("format", "json"))
            .and(query_param("p", "1"))
            .and(query_param("n", "5"))
            .and(query_param("w", "周杰伦 晴天"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sunny_day_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let response = client
            .search_songs(&SearchQuery::new("周杰伦 晴天"))
            .await
            .unwrap();

        let songs = response.song_list().unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].song_id(), Some("0039MnYb0qxYhV"));
    }

    #[tokio::test]
    async fn test_search_sends_browser_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(SEARCH_PATH))
            .and(header("User-Agent", "Mozilla/5.0"))
            .and(header("Referer", "https://y.qq.com/"))
            .and(header("Origin", "https://y.qq.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sunny_day_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let query = NormalizedQuery::new("周杰伦", "晴天");

        assert!(client.search(&query, 5).await.is_some());
    }

    #[tokio::test]
    async fn test_search_uses_title_alone_without_artist() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("w", "JustATitle"))
            .and(query_param("n", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sunny_day_response()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let query = NormalizedQuery::new("", "JustATitle");

        assert!(client.search(&query, 3).await.is_some());
    }

    #[tokio::test]
    async fn test_search_empty_query_skips_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sunny_day_response()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);

        assert!(client.search(&NormalizedQuery::default(), 5).await.is_none());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let result = client.search_songs(&SearchQuery::new("anything")).await;

        assert!(matches!(result, Err(QqMusicError::ApiError { status: 500 })));
        assert!(client
            .search(&NormalizedQuery::new("a", "b"), 5)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("callback({not json"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let result = client.search_songs(&SearchQuery::new("anything")).await;

        assert!(matches!(result, Err(QqMusicError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_dropped() {
        let mock_server = MockServer::start().await;

        let mut body = br#"{"data":{"song":{"list":[{"songname":"A"#.to_vec();
        body.extend_from_slice(&[0xff, 0xfe]);
        body.extend_from_slice(br#"B","songmid":"x1"}]}}}"#);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let response = client
            .search_songs(&SearchQuery::new("AB"))
            .await
            .unwrap();

        let songs = response.song_list().unwrap();
        assert_eq!(songs[0].song_name(), "AB");
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sunny_day_response())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = QqMusicClient::builder()
            .base_url(format!("{}{}", mock_server.uri(), SEARCH_PATH))
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let result = client.search_songs(&SearchQuery::new("slow")).await;
        assert!(matches!(result, Err(QqMusicError::Timeout)));
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_none() {
        let client = QqMusicClient::builder()
            .base_url("http://127.0.0.1:9/search")
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        assert!(client
            .search(&NormalizedQuery::new("a", "b"), 5)
            .await
            .is_none());
    }
}
