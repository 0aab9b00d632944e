use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use termrag_core::config::LlmSettings;
use termrag_core::traits::Completer;
use termrag_core::Error;
use termrag_llm::OpenAiChat;

/// Accept a single connection, capture the request and answer with `status` and `body`.
fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        thread::sleep(delay);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes());
        request
    });
    (endpoint, handle)
}

fn read_request(stream: &mut impl Read) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let length = text[..head_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn settings(endpoint: &str, timeout_secs: u64) -> LlmSettings {
    LlmSettings {
        model: "gpt-4o-mini".into(),
        temperature: 0.0,
        endpoint: endpoint.into(),
        timeout_secs,
    }
}

#[test]
fn complete_returns_first_message_content() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"term\":\"REST API\",\"definition\":\"d\",\"example\":\"e\"}"}}]}"#;
    let (endpoint, server) = serve_once("200 OK", body, Duration::ZERO);
    let chat = OpenAiChat::new(&settings(&endpoint, 5), "test-key").unwrap();

    let out = chat.complete("What is REST API?").expect("completion");
    assert_eq!(out, r#"{"term":"REST API","definition":"d","example":"e"}"#);

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request.to_ascii_lowercase().contains("authorization: bearer test-key"));
    assert!(request.contains(r#""model":"gpt-4o-mini""#));
    assert!(request.contains("What is REST API?"));
}

#[test]
fn non_success_status_is_a_completion_error() {
    let (endpoint, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#, Duration::ZERO);
    let chat = OpenAiChat::new(&settings(&endpoint, 5), "k").unwrap();
    let err = chat.complete("hi").unwrap_err();
    assert!(matches!(err, Error::Completion(ref m) if m.contains("boom")), "{err}");
    server.join().unwrap();
}

#[test]
fn empty_choices_is_a_completion_error() {
    let (endpoint, server) = serve_once("200 OK", r#"{"choices":[]}"#, Duration::ZERO);
    let chat = OpenAiChat::new(&settings(&endpoint, 5), "k").unwrap();
    assert!(matches!(chat.complete("hi"), Err(Error::Completion(_))));
    server.join().unwrap();
}

#[test]
fn slow_provider_times_out() {
    let (endpoint, server) = serve_once("200 OK", r#"{"choices":[]}"#, Duration::from_secs(3));
    let chat = OpenAiChat::new(&settings(&endpoint, 1), "k").unwrap();
    assert!(matches!(chat.complete("hi"), Err(Error::Timeout("completion"))));
    server.join().unwrap();
}

#[test]
fn rejects_invalid_endpoint_and_temperature() {
    assert!(matches!(OpenAiChat::new(&settings("localhost:8080", 5), "k"), Err(Error::InvalidConfig(_))));
    let mut s = settings("https://api.openai.com", 5);
    s.temperature = -1.0;
    assert!(matches!(OpenAiChat::new(&s, "k"), Err(Error::InvalidConfig(_))));
}
