#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mailtriage_core::{EmailType, FilterSet, ReadFilter};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::{FetchError, RemoteError};
    use crate::fetcher::{EmailRemote, HttpEmailApi, PageFetcher};
    use crate::testing::email;

    fn api(server: &MockServer) -> HttpEmailApi {
        HttpEmailApi::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_normalized_filters() {
        let server = MockServer::start().await;
        let items = vec![email(9), email(7)];
        Mock::given(method("GET"))
            .and(path("/api/email/list"))
            .and(query_param("limit", "50"))
            .and(query_param("offset", "100"))
            .and(query_param("read_status", "0"))
            .and(query_param("email_type", "auth_code,auth_link"))
            .and(query_param("recipient", "a@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": &items,
                "status": 200,
                "meta": { "total": 102 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sig = FilterSet::new(ReadFilter::Unread)
            .with_email_types([EmailType::AuthLink, EmailType::AuthCode])
            .with_recipients([" a@example.com "])
            .signature();
        let page = api(&server).fetch(&sig, 100, 50).await.unwrap();
        assert_eq!(page.total, 102);
        assert_eq!(page.items, items);
    }

    #[tokio::test]
    async fn test_fetch_without_meta_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "data": [], "status": 200})),
            )
            .mount(&server)
            .await;

        let err = api(&server).fetch(&FilterSet::default().signature(), 0, 50).await.unwrap_err();
        assert!(matches!(err, FetchError::Remote(RemoteError::Envelope(_))));
    }

    #[tokio::test]
    async fn test_failure_envelope_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/email/mark"))
            .and(query_param("id", "7"))
            .and(query_param("is_read", "1"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Invalid email ID",
                "status": 400
            })))
            .mount(&server)
            .await;

        match api(&server).mark(7, true).await.unwrap_err() {
            RemoteError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid email ID");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = api(&server).delete(3).await.unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, RemoteError::Status { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[tokio::test]
    async fn test_batch_delete_and_update_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/email/batch-delete"))
            .and(body_json(json!({"ids": [1, 2, 3]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"deleted": 2},
                "status": 200
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/email/update"))
            .and(body_json(json!({"id": 4, "emailResult": "1234", "emailType": "auth_code"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": null,
                "status": 200
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = api(&server);
        assert_eq!(client.batch_delete(&[1, 2, 3]).await.unwrap(), 2);
        client.update_result(4, Some("1234"), EmailType::AuthCode).await.unwrap();
    }

    #[tokio::test]
    async fn test_recipients() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/email/recipients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": ["a@example.com", "b@example.com"],
                "status": 200
            })))
            .mount(&server)
            .await;

        let recipients = api(&server).recipients().await.unwrap();
        assert_eq!(recipients, vec!["a@example.com", "b@example.com"]);
    }
}
