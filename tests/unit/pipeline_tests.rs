// End-to-end request pipeline scenarios over the in-memory store

use image_request::config::{Config, SignatureConfig};
use image_request::request::decoder::{encode_request, DecodedRequest};
use image_request::request::{ImageRequestPipeline, OutputFormat, RequestDialect, RequestEvent};
use image_request::response::{error_response, success_headers};
use image_request::signature::{generate_signature, StaticSecretProvider};
use image_request::storage::{InMemoryObjectStore, OriginObject};
use serde_json::{json, Value};

const PNG: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];
const JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE1];
const SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";

fn default_path(request: Value) -> String {
    let request: DecodedRequest = serde_json::from_value(request).unwrap();
    format!("/{}", encode_request(&request).unwrap())
}

fn store_with(bucket: &str, key: &str, body: &[u8], content_type: &str) -> InMemoryObjectStore {
    let store = InMemoryObjectStore::new();
    store.insert(
        bucket,
        key,
        OriginObject::new(body.to_vec()).with_content_type(content_type),
    );
    store
}

fn buckets(list: &str) -> Config {
    Config {
        source_buckets: Some(list.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_thumbor_quality_scenario() {
    let store = store_with("myimages-bucket", "myimages/cat.jpg", &JPEG, "image/jpeg");
    let config = buckets("myimages-bucket");
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let info = pipeline
        .setup(&RequestEvent::new("/100x100/filters:quality(80)/myimages/cat.jpg"))
        .await
        .unwrap();

    assert_eq!(info.request_type, RequestDialect::Thumbor);
    assert_eq!(info.bucket, "myimages-bucket");
    assert_eq!(info.key, "myimages/cat.jpg");
    let edits = serde_json::to_value(&info.edits).unwrap();
    assert_eq!(edits["resize"], json!({"width": 100, "height": 100}));
    assert_eq!(edits["jpeg"], json!({"quality": 80}));
}

#[tokio::test]
async fn test_default_scenario_descriptor() {
    let store = store_with("allowed-bucket", "a/b.png", &PNG, "image/png");
    let config = buckets("allowed-bucket");
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let path = default_path(json!({"bucket": "allowed-bucket", "key": "a/b.png", "edits": {}}));
    let info = pipeline.setup(&RequestEvent::new(path)).await.unwrap();

    let descriptor = serde_json::to_value(&info).unwrap();
    assert_eq!(descriptor["requestType"], "Default");
    assert_eq!(descriptor["bucket"], "allowed-bucket");
    assert_eq!(descriptor["key"], "a/b.png");
    assert_eq!(descriptor["contentType"], "image/png");
    assert_eq!(descriptor["cacheControl"], "max-age=31536000,public");
    assert!(descriptor.get("originalImage").is_none());
    assert!(descriptor.get("outputFormat").is_none());
}

#[tokio::test]
async fn test_default_bucket_outside_allow_list() {
    let store = store_with("secret-bucket", "a.png", &PNG, "image/png");
    let config = buckets("allowed-bucket");
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let path = default_path(json!({"bucket": "secret-bucket", "key": "a.png"}));
    let err = pipeline.setup(&RequestEvent::new(path)).await.unwrap_err();
    assert_eq!(err.code, "CannotAccessBucket");
    assert_eq!(err.status(), 403);
    assert!(store.requests().is_empty());
}

#[tokio::test]
async fn test_default_webp_reduction_effort() {
    let store = store_with("b", "a.png", &PNG, "image/png");
    let config = buckets("b");
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    for (requested, expected) in [(json!(2.9), 2), (json!(9), 4), (json!("x"), 4)] {
        let path = default_path(json!({
            "bucket": "b",
            "key": "a.png",
            "outputFormat": "webp",
            "reductionEffort": requested,
        }));
        let info = pipeline.setup(&RequestEvent::new(path)).await.unwrap();
        assert_eq!(info.output_format, Some(OutputFormat::Webp));
        assert_eq!(info.content_type, "image/webp");
        assert_eq!(info.reduction_effort, Some(expected));
    }
}

#[tokio::test]
async fn test_default_headers_reach_response() {
    let store = store_with("b", "a.png", &PNG, "image/png");
    let config = buckets("b");
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let path = default_path(json!({
        "bucket": "b",
        "key": "a.png",
        "headers": {"Cache-Control": "max-age=60"}
    }));
    let info = pipeline.setup(&RequestEvent::new(path)).await.unwrap();
    let headers = success_headers(&info, &config);
    assert_eq!(headers.get("Cache-Control").map(String::as_str), Some("max-age=60"));
    assert_eq!(headers.get("Content-Type").map(String::as_str), Some("image/png"));
}

#[tokio::test]
async fn test_svg_with_edits_becomes_png() {
    let store = store_with("logos", "logos/mark.svg", SVG, "image/svg+xml");
    let config = buckets("logos");
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let info = pipeline
        .setup(&RequestEvent::new("/200x200/logos/mark.svg"))
        .await
        .unwrap();
    assert_eq!(info.output_format, Some(OutputFormat::Png));
    assert_eq!(info.content_type, "image/png");

    let info = pipeline
        .setup(&RequestEvent::new("/logos/mark.svg"))
        .await
        .unwrap();
    assert_eq!(info.output_format, None);
    assert_eq!(info.content_type, "image/svg+xml");
}

#[tokio::test]
async fn test_fallback_image_scenario() {
    let store = store_with("images-bucket", "images/default.jpg", &JPEG, "image/jpeg");
    let config = buckets("images-bucket");
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let info = pipeline
        .setup(&RequestEvent::new("/images/photo.jpg"))
        .await
        .unwrap();
    assert_eq!(info.key, "images/photo.jpg");
    assert_eq!(info.original_image.as_ref(), &JPEG);
    assert_eq!(store.requests().len(), 2);

    let empty = InMemoryObjectStore::new();
    let pipeline = ImageRequestPipeline::new(&config, &empty, &secrets);
    let err = pipeline
        .setup(&RequestEvent::new("/images/photo.jpg"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(empty.requests().len(), 2);
}

#[tokio::test]
async fn test_fallback_bucket_used_for_unknown_alias() {
    let store = store_with("fallback-bucket", "unknown/a.jpg", &JPEG, "image/jpeg");
    let config = Config {
        source_buckets: Some("alpha,beta".to_string()),
        fallback_bucket: Some("fallback-bucket".to_string()),
        ..Default::default()
    };
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let info = pipeline
        .setup(&RequestEvent::new("/unknown/a.jpg"))
        .await
        .unwrap();
    assert_eq!(info.bucket, "fallback-bucket");
}

#[tokio::test]
async fn test_signed_request_scenario() {
    let store = store_with("images-bucket", "images/cat.jpg", &JPEG, "image/jpeg");
    let config = Config {
        source_buckets: Some("images-bucket".to_string()),
        signature: SignatureConfig {
            enabled: true,
            secret_source_id: "image-handler".to_string(),
            secret_key_field: "signatureKey".to_string(),
        },
        ..Default::default()
    };
    let secrets =
        StaticSecretProvider::new().with_secret("image-handler", r#"{"signatureKey":"topsecret"}"#);
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let path = "/fit-in/400x400/filters:grayscale()/images/cat.jpg";
    let signature = generate_signature(path, "topsecret").unwrap();

    let info = pipeline
        .setup(&RequestEvent::new(path).with_query_param("signature", signature.clone()))
        .await
        .unwrap();
    assert_eq!(info.key, "images/cat.jpg");

    let mut tampered = signature.into_bytes();
    tampered[0] = if tampered[0] == b'a' { b'b' } else { b'a' };
    let tampered = String::from_utf8(tampered).unwrap();

    let err = pipeline
        .setup(&RequestEvent::new(path).with_query_param("signature", tampered))
        .await
        .unwrap_err();
    assert_eq!(err.code, "SignatureDoesNotMatch");
    assert_eq!(err.status(), 403);

    let response = error_response(&err, &config);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["code"], "SignatureDoesNotMatch");
}

#[tokio::test]
async fn test_missing_allow_list() {
    let store = InMemoryObjectStore::new();
    let config = Config::default();
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let err = pipeline
        .setup(&RequestEvent::new("/images/a.jpg"))
        .await
        .unwrap_err();
    assert_eq!(err.code, "NoSourceBuckets");
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_misshapen_default_payload_is_bad_request() {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let store = store_with("b", "a.jpg", &JPEG, "image/jpeg");
    let config = Config {
        source_buckets: Some("b".to_string()),
        rewrite: image_request::config::RewriteConfig {
            match_pattern: Some("/v2/".to_string()),
            substitution: Some("/".to_string()),
        },
        ..Default::default()
    };
    let secrets = StaticSecretProvider::new();
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    let path = format!("/{}", STANDARD.encode(r#"{"bucket":"b","key":"a.jpg","outputFormat":5}"#));
    let err = pipeline.setup(&RequestEvent::new(path)).await.unwrap_err();
    assert_eq!(err.code, "CannotDecodeRequest");
    assert_eq!(err.status(), 400);
    assert!(store.requests().is_empty());
}
