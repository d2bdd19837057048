use std::time::Duration;

use reqwest::StatusCode;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use webdav_core::{Credentials, Depth, WebDavClient, WebDavError};

fn client() -> WebDavClient {
    WebDavClient::with_credentials(Credentials::new("admin", "admin")).unwrap()
}

#[tokio::test]
async fn mkcol_sends_basic_auth() {
    let server = MockServer::start().await;

    Mock::given(method("MKCOL"))
        .and(path("/alfresco/webdav/Sites/docs/documentLibrary/New%20Folder"))
        .and(header("authorization", "Basic YWRtaW46YWRtaW4="))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let status = client()
        .mkcol(&format!(
            "{}/alfresco/webdav/Sites/docs/documentLibrary/New%20Folder",
            server.uri()
        ))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn propfind_requests_allprop_with_depth() {
    let server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/alfresco/webdav/Sites"))
        .and(header("depth", "1"))
        .and(body_string_contains("allprop"))
        .respond_with(ResponseTemplate::new(207).set_body_string(
            r#"<?xml version="1.0"?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/alfresco/webdav/Sites/</D:href>
    <D:propstat><D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop>
    <D:status>HTTP/1.1 200 OK</D:status></D:propstat>
  </D:response>
  <D:response>
    <D:href>/alfresco/webdav/Sites/site-a/</D:href>
    <D:propstat><D:prop><D:resourcetype><D:collection/></D:resourcetype></D:prop>
    <D:status>HTTP/1.1 200 OK</D:status></D:propstat>
  </D:response>
</D:multistatus>"#,
        ))
        .mount(&server)
        .await;

    let response = client()
        .propfind(&format!("{}/alfresco/webdav/Sites", server.uri()), Depth::One)
        .await
        .unwrap();
    let status = response.multi_status().unwrap();

    assert_eq!(status.responses.len(), 2);
    assert_eq!(status.responses[1].name(), "site-a");
    assert!(status.responses[1].is_collection);
}

#[tokio::test]
async fn propfind_on_missing_resource_is_a_protocol_fault() {
    let server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = client()
        .propfind(&format!("{}/alfresco/webdav/missing", server.uri()), Depth::Zero)
        .await
        .unwrap();

    assert!(matches!(
        response.multi_status(),
        Err(WebDavError::NotMultiStatus { status }) if status == StatusCode::NOT_FOUND
    ));
}

#[tokio::test]
async fn move_sends_destination_and_overwrite_flag() {
    let server = MockServer::start().await;
    let destination = format!("{}/alfresco/webdav/Shared/b.txt", server.uri());

    Mock::given(method("MOVE"))
        .and(path("/alfresco/webdav/Shared/a.txt"))
        .and(header("destination", destination.as_str()))
        .and(header("overwrite", "F"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let status = client()
        .move_resource(
            &format!("{}/alfresco/webdav/Shared/a.txt", server.uri()),
            &destination,
            false,
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn copy_with_overwrite_sends_t() {
    let server = MockServer::start().await;

    Mock::given(method("COPY"))
        .and(path("/alfresco/webdav/Shared/a.txt"))
        .and(header("overwrite", "T"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let status = client()
        .copy_resource(
            &format!("{}/alfresco/webdav/Shared/a.txt", server.uri()),
            &format!("{}/alfresco/webdav/Other/a.txt", server.uri()),
            true,
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn lock_reads_token_from_header() {
    let server = MockServer::start().await;

    Mock::given(method("LOCK"))
        .and(path("/alfresco/webdav/Shared/a.txt"))
        .and(header("timeout", "Second-600"))
        .and(body_string_contains("<D:owner>admin</D:owner>"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("Lock-Token", "<opaquelocktoken:from-header>"),
        )
        .mount(&server)
        .await;

    let response = client()
        .lock(
            &format!("{}/alfresco/webdav/Shared/a.txt", server.uri()),
            "admin",
            Duration::from_secs(600),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.token.as_deref(), Some("opaquelocktoken:from-header"));
}

#[tokio::test]
async fn lock_falls_back_to_body_token() {
    let server = MockServer::start().await;

    Mock::given(method("LOCK"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<D:prop xmlns:D="DAV:"><D:lockdiscovery><D:activelock>
<D:locktoken><D:href>opaquelocktoken:from-body</D:href></D:locktoken>
</D:activelock></D:lockdiscovery></D:prop>"#,
        ))
        .mount(&server)
        .await;

    let response = client()
        .lock(
            &format!("{}/alfresco/webdav/Shared/a.txt", server.uri()),
            "admin",
            Duration::from_secs(600),
        )
        .await
        .unwrap();

    assert_eq!(response.token.as_deref(), Some("opaquelocktoken:from-body"));
}

#[tokio::test]
async fn locked_put_and_unlock_carry_the_token() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(header("if", "(<opaquelocktoken:t1>)"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("UNLOCK"))
        .and(header("lock-token", "<opaquelocktoken:t1>"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/alfresco/webdav/Shared/a.txt", server.uri());
    let client = client();
    let put = client
        .put_locked(&url, b"payload".to_vec(), "opaquelocktoken:t1")
        .await
        .unwrap();
    let unlock = client.unlock(&url, "opaquelocktoken:t1").await.unwrap();

    assert_eq!(put, StatusCode::NO_CONTENT);
    assert_eq!(unlock, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn get_exposes_headers_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/alfresco/webdav/Shared/a.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/plain")
                .set_body_bytes(b"hello"),
        )
        .mount(&server)
        .await;

    let response = client()
        .get(&format!("{}/alfresco/webdav/Shared/a.txt", server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.header("content-disposition"), None);
    assert_eq!(response.body, b"hello");
}

#[tokio::test]
async fn invalid_url_is_rejected_before_sending() {
    let err = client().delete("not a url").await.unwrap_err();
    assert!(matches!(err, WebDavError::Url(_)));
}
