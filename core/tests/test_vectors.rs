//! Verify response normalization against the JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each case describes one raw HTTP response and either the payload it must
//! resolve to or the error class and message it must be rejected with.

use sidehustle_core::{ApiClient, ApiError, HttpResponse, Payload};

fn client() -> ApiClient {
    ApiClient::new("http://localhost:8000/api")
}

fn error_class(err: &ApiError) -> &'static str {
    match err {
        ApiError::Network(_) => "Network",
        ApiError::MalformedResponse { .. } => "MalformedResponse",
        ApiError::Transport { .. } => "Transport",
        ApiError::Api { .. } => "Api",
        ApiError::Validation(_) => "Validation",
        ApiError::Deserialization(_) => "Deserialization",
        ApiError::Serialization(_) => "Serialization",
        ApiError::Storage(_) => "Storage",
    }
}

#[test]
fn normalize_test_vectors() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["response"];
        let headers = match sim["content_type"].as_str() {
            Some(ct) => vec![("Content-Type".to_string(), ct.to_string())],
            None => Vec::new(),
        };
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            status_text: sim["status_text"].as_str().unwrap().to_string(),
            headers,
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let result = c.parse_response(response);

        if let Some(expected) = case.get("expected_json") {
            assert_eq!(result.unwrap(), Payload::Json(expected.clone()), "{name}: payload");
        } else if let Some(expected) = case.get("expected_text") {
            let text = expected.as_str().unwrap().to_string();
            assert_eq!(result.unwrap(), Payload::Text(text), "{name}: payload");
        } else {
            let err = result.unwrap_err();
            let expected_class = case["expected_error"].as_str().unwrap();
            assert_eq!(error_class(&err), expected_class, "{name}: error class");

            let message = err.to_string();
            if let Some(expected) = case.get("expected_message") {
                assert_eq!(message, expected.as_str().unwrap(), "{name}: message");
            }
            if let Some(fragments) = case.get("expected_contains") {
                for fragment in fragments.as_array().unwrap() {
                    let fragment = fragment.as_str().unwrap();
                    assert!(message.contains(fragment), "{name}: {message:?} lacks {fragment:?}");
                }
            }
        }
    }
}
