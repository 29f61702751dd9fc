//! Talks to a one-shot local HTTP server standing in for the extraction
//! service.

use std::io::Write;

use citeharvest_core::{StructuredExtractor, StructuredServiceError};
use citeharvest_grobid::GrobidClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const TEI: &str = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><text><back><listBibl>
<biblStruct><analytic><title>First Paper</title>
<author><persName><forename>Jane</forename><surname>Smith</surname></persName></author>
</analytic><monogr><imprint><date when="2020"/></imprint></monogr></biblStruct>
<biblStruct><analytic><title>Second Paper</title></analytic>
<idno type="DOI">10.1234/abcd.5678</idno></biblStruct>
</listBibl></back></text></TEI>"#;

/// Read one HTTP request (headers plus body) from `socket`.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        let Some(header_end) = text.find("\r\n\r\n") else {
            continue;
        };
        let headers = text[..header_end].to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let done = match content_length {
            Some(len) => buf.len() >= header_end + 4 + len,
            None => !headers.contains("chunked") || buf.ends_with(b"0\r\n\r\n"),
        };
        if done {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve a single canned response, returning the base URL and the request.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });
    (base_url, handle)
}

fn dummy_pdf() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();
    file
}

#[tokio::test]
async fn parses_service_response_in_order() {
    let (base_url, server) = serve_once("200 OK", TEI).await;
    let pdf = dummy_pdf();

    let client = GrobidClient::new(format!("{}/", base_url), reqwest::Client::new());
    let refs = client.extract(pdf.path()).await.unwrap();

    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].ref_num(), Some("1"));
    assert_eq!(refs[0].text(), "Smith, Jane. (2020). First Paper");
    assert_eq!(refs[1].ref_num(), Some("2"));
    assert_eq!(refs[1].doi(), Some("10.1234/abcd.5678"));
    assert_eq!(refs[1].author(), None);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /api/processReferences "));
    assert!(request.contains("name=\"input\""));
    assert!(request.contains("%PDF-1.4"));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (base_url, server) = serve_once("503 Service Unavailable", "busy").await;
    let pdf = dummy_pdf();

    let client = GrobidClient::new(base_url, reqwest::Client::new());
    let err = client.extract(pdf.path()).await.unwrap_err();
    match err {
        StructuredServiceError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "busy");
        }
        other => panic!("unexpected error: {other}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_service_is_an_error() {
    let pdf = dummy_pdf();
    let client = GrobidClient::new("http://127.0.0.1:1", reqwest::Client::new());
    let err = client.extract(pdf.path()).await.unwrap_err();
    assert!(matches!(err, StructuredServiceError::Unreachable { .. }));
}
