//! HTTP backend against a mock language service.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tracklang_oracle::{
    HttpLanguageModel, HttpModelConfig, LanguageModel, LanguageOracle, OracleError, OracleOptions,
};

fn pcm() -> Vec<f32> {
    (0..16000).map(|i| (i as f32 * 0.01).sin() * 0.3).collect()
}

#[tokio::test]
async fn test_identify_posts_wav() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/detect-language"))
        .and(header("content-type", "audio/wav"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "language": "de",
            "probability": 0.91
        })))
        .expect(1)
        .mount(&server)
        .await;

    let model = HttpLanguageModel::new(HttpModelConfig::new(server.uri())).unwrap();
    let result = model.identify(&pcm()).await.unwrap();
    assert_eq!(result.language, "de");
    assert!((result.probability - 0.91).abs() < 1e-6);
}

#[tokio::test]
async fn test_transcribe_passes_language() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transcribe"))
        .and(query_param("language", "es"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "buenas noches"})))
        .mount(&server)
        .await;

    let model = HttpLanguageModel::new(HttpModelConfig::new(format!("{}/", server.uri()))).unwrap();
    assert_eq!(model.transcribe(&pcm(), "es").await.unwrap(), "buenas noches");
}

#[tokio::test]
async fn test_transcribe_escapes_language() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/transcribe"))
        .and(query_param("language", "pt&task=translate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "boa noite"})))
        .expect(1)
        .mount(&server)
        .await;

    let model = HttpLanguageModel::new(HttpModelConfig::new(server.uri())).unwrap();
    let text = model.transcribe(&pcm(), "pt&task=translate").await.unwrap();
    assert_eq!(text, "boa noite");
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/detect-language"))
        .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
        .mount(&server)
        .await;

    let model = HttpLanguageModel::new(HttpModelConfig::new(server.uri())).unwrap();
    match model.identify(&pcm()).await.unwrap_err() {
        OracleError::Server { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "loading model");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/detect-language"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lang": "en"})))
        .mount(&server)
        .await;

    let model = HttpLanguageModel::new(HttpModelConfig::new(server.uri())).unwrap();
    assert!(matches!(
        model.identify(&pcm()).await.unwrap_err(),
        OracleError::InvalidResponse(_)
    ));
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let model = HttpLanguageModel::new(HttpModelConfig::new(server.uri())).unwrap();
    model.health().await.unwrap();
}

#[tokio::test]
async fn test_oracle_over_http_maps_iso() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/detect-language"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "language": "ja",
            "probability": 0.77
        })))
        .mount(&server)
        .await;

    let model = HttpLanguageModel::new(HttpModelConfig::new(server.uri())).unwrap();
    let oracle = LanguageOracle::new(std::sync::Arc::new(model), OracleOptions::default());
    let detection = oracle.detect(&pcm()).await.unwrap();
    assert_eq!(detection.language_iso, "jpn");
    assert!((detection.confidence - 0.77).abs() < 1e-6);
}
