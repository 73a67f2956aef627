// Dialect classification priority and path mapping

use base64::{engine::general_purpose::STANDARD, Engine};
use image_request::config::{Config, RewriteConfig};
use image_request::request::decoder::{decode_request, encode_request, DecodedRequest};
use image_request::request::dialect::classify;
use image_request::request::RequestDialect;
use image_request::thumbor::{map_path_to_edits, parse_key};
use rstest::rstest;
use serde_json::json;

fn encoded(request: serde_json::Value) -> String {
    let request: DecodedRequest = serde_json::from_value(request).unwrap();
    format!("/{}", encode_request(&request).unwrap())
}

fn config_with_rewrite(rewrite: bool) -> Config {
    if !rewrite {
        return Config::default();
    }
    Config {
        rewrite: RewriteConfig {
            match_pattern: Some("/v2/".to_string()),
            substitution: Some("/".to_string()),
        },
        ..Default::default()
    }
}

#[rstest]
#[case::thumbor_path("/200x300/images/cat.jpg", false, RequestDialect::Thumbor)]
#[case::thumbor_filters("/filters:grayscale()/cat.png", false, RequestDialect::Thumbor)]
#[case::thumbor_svg("/fit-in/100x100/logo.svg", false, RequestDialect::Thumbor)]
#[case::custom_wins_over_thumbor("/200x300/images/cat.jpg", true, RequestDialect::Custom)]
#[case::custom_without_extension("/v2/anything", true, RequestDialect::Custom)]
fn test_path_dialects(#[case] path: &str, #[case] rewrite: bool, #[case] expected: RequestDialect) {
    let dialect = classify(Some(path), &config_with_rewrite(rewrite)).unwrap();
    assert_eq!(dialect, expected);
}

#[rstest]
#[case(false)]
#[case(true)]
fn test_default_always_wins(#[case] rewrite: bool) {
    let path = encoded(json!({"bucket": "b", "key": "cat.jpg"}));
    let dialect = classify(Some(&path), &config_with_rewrite(rewrite)).unwrap();
    assert_eq!(dialect, RequestDialect::Default);
}

#[rstest]
#[case::numeric_output_format(r#"{"bucket":"b","key":"a.jpg","outputFormat":5}"#, false)]
#[case::numeric_output_format_with_rewrite(r#"{"bucket":"b","key":"a.jpg","outputFormat":5}"#, true)]
#[case::string_edits(r#"{"key":"a.jpg","edits":"none"}"#, false)]
#[case::string_edits_with_rewrite(r#"{"key":"a.jpg","edits":"none"}"#, true)]
#[case::numeric_key(r#"{"key":7}"#, true)]
fn test_any_json_payload_is_default(#[case] payload: &str, #[case] rewrite: bool) {
    let path = format!("/{}", STANDARD.encode(payload));
    let dialect = classify(Some(&path), &config_with_rewrite(rewrite)).unwrap();
    assert_eq!(dialect, RequestDialect::Default);

    let err = decode_request(Some(&path)).unwrap_err();
    assert_eq!(err.code, "CannotDecodeRequest");
    assert_eq!(err.status(), 400);
}

#[rstest]
#[case::no_extension("/images/cat")]
#[case::text_file("/notes.txt")]
#[case::empty("")]
fn test_unrecognized_without_rewrite(#[case] path: &str) {
    let err = classify(Some(path), &Config::default()).unwrap_err();
    assert_eq!(err.code, "UnrecognizedDialect");
    assert_eq!(err.status(), 400);
}

#[rstest]
#[case("/fit-in/200x300/filters:grayscale()/photos/cat.jpg", "photos/cat.jpg")]
#[case("/10x10:90x90/300x0/photos/cat.jpg", "photos/cat.jpg")]
#[case("/photos/cat%20face.jpg", "photos/cat face.jpg")]
#[case("/photos/200x300.jpg", "photos/200x300.jpg")]
fn test_key_recovery(#[case] path: &str, #[case] key: &str) {
    assert_eq!(parse_key(path).unwrap(), key);
}

#[test]
fn test_thumbor_edits_are_ordered() {
    let edits =
        map_path_to_edits("/fit-in/10x10:90x90/300x200/filters:grayscale()/filters:rotate(90)/cat.png")
            .unwrap();
    let keys: Vec<&str> = edits.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["crop", "resize", "grayscale", "rotate"]);
    assert_eq!(
        serde_json::to_value(&edits).unwrap()["resize"],
        json!({"width": 300, "height": 200, "fit": "inside"})
    );
}
