// Configuration loading from YAML files

use image_request::config::Config;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
fn test_from_file_loads_all_sections() {
    let file = write_config(
        r#"
source_buckets: "images-bucket, assets-bucket"
auto_webp: true
fallback_bucket: "fallback-bucket"
signature:
  enabled: false
rewrite:
  match_pattern: "/(\\d+)w\\/(.*)/"
  substitution: "fit-in/$1x0/$2"
cors:
  enabled: true
  origin: "https://example.com"
"#,
    );

    let config = Config::from_file(file.path()).expect("Failed to load config");
    assert!(config.auto_webp);
    assert_eq!(config.fallback_bucket.as_deref(), Some("fallback-bucket"));
    assert_eq!(
        config.allowed_source_buckets().unwrap(),
        vec!["images-bucket".to_string(), "assets-bucket".to_string()]
    );
    assert!(config.rewrite_rule().is_some());
    assert!(config.cors.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file_substitutes_environment() {
    std::env::set_var("IMAGE_REQUEST_TEST_BUCKETS", "env-bucket");
    let file = write_config("source_buckets: \"${IMAGE_REQUEST_TEST_BUCKETS}\"\n");

    let config = Config::from_file(file.path()).expect("Failed to load config");
    assert_eq!(config.allowed_source_buckets().unwrap(), vec!["env-bucket".to_string()]);
}

#[test]
fn test_from_file_missing_file() {
    let err = Config::from_file("/nonexistent/image-request.yaml").unwrap_err();
    assert!(err.contains("Failed to read config file"));
}

#[test]
fn test_from_file_invalid_yaml() {
    let file = write_config("auto_webp: [not, a, bool\n");
    assert!(Config::from_file(file.path()).is_err());
}

#[test]
fn test_validate_cors_requires_origin() {
    let file = write_config("cors:\n  enabled: true\n");
    let config = Config::from_file(file.path()).expect("Failed to load config");
    assert!(config.validate().is_err());
}
