//! Contract tests for the pinning-service blob store client.

use docledger_client::{BlobError, BlobStore, BlobStoreConfig, PinningBlobStore};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store(api: &MockServer, gateway: &MockServer) -> PinningBlobStore {
    let cfg = BlobStoreConfig::new(
        Url::parse(&api.uri()).unwrap(),
        Url::parse(&gateway.uri()).unwrap(),
        "test-jwt",
    );
    PinningBlobStore::new(cfg).unwrap()
}

#[tokio::test]
async fn upload_posts_multipart_with_bearer_and_returns_gateway_locator() {
    let api = MockServer::start().await;
    let gateway = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .and(header("authorization", "Bearer test-jwt"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "IpfsHash": "QmTestCid",
            "PinSize": 9,
            "Timestamp": "2024-05-01T10:00:00Z"
        })))
        .expect(1)
        .mount(&api)
        .await;

    let locator = store(&api, &gateway)
        .upload("DL1234_Transcript.pdf", b"pdf bytes")
        .await
        .unwrap();

    assert_eq!(locator, format!("{}/ipfs/QmTestCid", gateway.uri()));
}

#[tokio::test]
async fn rejected_upload_is_an_upload_error() {
    let api = MockServer::start().await;
    let gateway = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid jwt"))
        .mount(&api)
        .await;

    let err = store(&api, &gateway)
        .upload("DL1234_Transcript.pdf", b"pdf bytes")
        .await
        .unwrap_err();

    match err {
        BlobError::Upload { file_name, reason } => {
            assert_eq!(file_name, "DL1234_Transcript.pdf");
            assert!(reason.contains("401"));
        }
        other => panic!("expected Upload, got {other:?}"),
    }
}

#[tokio::test]
async fn retrieve_fetches_bytes_from_gateway() {
    let api = MockServer::start().await;
    let gateway = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ipfs/QmTestCid"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf bytes".to_vec()))
        .mount(&gateway)
        .await;

    let bytes = store(&api, &gateway)
        .retrieve(&format!("{}/ipfs/QmTestCid", gateway.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, b"pdf bytes");
}

#[tokio::test]
async fn missing_content_is_a_retrieve_error() {
    let api = MockServer::start().await;
    let gateway = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&gateway)
        .await;

    let err = store(&api, &gateway)
        .retrieve(&format!("{}/ipfs/QmMissing", gateway.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, BlobError::Retrieve { .. }));
}
