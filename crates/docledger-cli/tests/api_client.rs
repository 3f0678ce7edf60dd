//! CLI service client and local verification against a mocked service.

use std::io::Write;
use std::sync::Arc;

use docledger_cli::api::ApiClient;
use docledger_cli::batch::{run_batch, BatchArgs, BatchCommand};
use docledger_cli::document::run_verify;
use docledger_core::{hash_bytes, DocumentRecord, DocumentType, NewDocument, OwnerId};
use docledger_pipeline::{BatchProcessor, VerificationEngine};
use url::Url;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(owner: &str, content: &[u8]) -> DocumentRecord {
    NewDocument {
        owner_id: OwnerId::new(owner).unwrap(),
        content_hash: hash_bytes(content),
        storage_locator: format!("https://gateway.example/ipfs/{}", hash_bytes(content).to_hex()),
        document_type: DocumentType::new("Transcript").unwrap(),
    }
    .into_record()
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&Url::parse(&server.uri()).unwrap()).unwrap()
}

async fn serve_owner(server: &MockServer, owner: &str, records: &[DocumentRecord]) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/documents/owner/{owner}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(records))
        .mount(server)
        .await;
}

#[tokio::test]
async fn lookup_decodes_records() {
    let server = MockServer::start().await;
    let stored = vec![record("DL1234", b"one"), record("DL1234", b"two")];
    serve_owner(&server, "DL1234", &stored).await;

    let records = client(&server)
        .lookup(&OwnerId::new("DL1234").unwrap())
        .await
        .unwrap();
    assert_eq!(records, stored);
}

#[tokio::test]
async fn error_body_surfaces_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/owner/DL1234"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {"code": "INTERNAL_ERROR", "message": "An internal error occurred"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .lookup(&OwnerId::new("DL1234").unwrap())
        .await
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("INTERNAL_ERROR"), "{msg}");
    assert!(msg.contains("An internal error occurred"), "{msg}");
}

#[tokio::test]
async fn issue_posts_multipart_form() {
    let server = MockServer::start().await;
    let issued_record = record("DL1234", b"doc");
    Mock::given(method("POST"))
        .and(path("/v1/documents/issue"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "transaction_id": "0xabc",
            "block_number": 7,
            "chain": "mock",
            "locator": issued_record.storage_locator,
            "record": issued_record,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issued = client(&server)
        .issue(
            "DL1234_Transcript.pdf",
            b"doc".to_vec(),
            &OwnerId::new("DL1234").unwrap(),
            &DocumentType::new("Transcript").unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(issued.transaction_id, "0xabc");
    assert_eq!(issued.record, issued_record);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"owner_id\""));
    assert!(body.contains(&hash_bytes(b"doc").to_base64()));
    assert!(body.contains("filename=\"DL1234_Transcript.pdf\""));
}

#[tokio::test]
async fn local_verification_uses_service_records() {
    let server = MockServer::start().await;
    serve_owner(&server, "DL1234", &[record("DL1234", b"original")]).await;

    let engine = VerificationEngine::new(Arc::new(client(&server)));
    let good = engine.verify("DL1234_Transcript.pdf", b"original").await.unwrap();
    assert!(good.matched);
    let bad = engine.verify("DL1234_Transcript.pdf", b"tampered").await.unwrap();
    assert!(!bad.matched);
    assert_eq!(bad.candidate_records.len(), 1);
}

#[tokio::test]
async fn verify_command_exit_codes() {
    let server = MockServer::start().await;
    serve_owner(&server, "DL1234", &[record("DL1234", b"original")]).await;
    let api = client(&server);

    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("DL1234_Transcript.pdf");
    std::fs::write(&good, b"original").unwrap();
    assert_eq!(run_verify(&api, &good).await.unwrap(), 0);

    let tampered_dir = dir.path().join("tampered");
    std::fs::create_dir(&tampered_dir).unwrap();
    let tampered = tampered_dir.join("DL1234_Transcript.pdf");
    std::fs::write(&tampered, b"tampered").unwrap();
    assert_eq!(run_verify(&api, &tampered).await.unwrap(), 1);

    let unnamed = dir.path().join("certificate.pdf");
    std::fs::write(&unnamed, b"original").unwrap();
    assert!(run_verify(&api, &unnamed).await.is_err());
}

#[tokio::test]
async fn batch_verify_reports_failures_in_exit_code() {
    let server = MockServer::start().await;
    serve_owner(&server, "DL1234", &[record("DL1234", b"transcript")]).await;
    serve_owner(&server, "AB0001", &[]).await;

    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("batch.zip");
    let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive).unwrap());
    for (name, text) in [
        ("DL1234_Transcript.pdf", "transcript"),
        ("AB0001_Degree.pdf", "degree"),
    ] {
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(text.as_bytes()).unwrap();
    }
    writer.finish().unwrap();

    let api = client(&server);
    let report = BatchProcessor::new(VerificationEngine::new(Arc::new(api.clone())))
        .run_path(&archive, |_| {})
        .await
        .unwrap();
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed[0].file_name, "AB0001_Degree.pdf");

    let code = run_batch(
        &api,
        &BatchArgs {
            command: BatchCommand::Verify { archive },
        },
    )
    .await
    .unwrap();
    assert_eq!(code, 1);
}
