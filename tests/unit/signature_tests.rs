// Signature validation against a mocked secret provider

use async_trait::async_trait;
use image_request::config::SignatureConfig;
use image_request::signature::{generate_signature, validate_signature, SecretError, SecretProvider};
use mockall::mock;
use std::collections::HashMap;

mock! {
    pub Secrets {}

    #[async_trait]
    impl SecretProvider for Secrets {
        async fn get_secret(&self, id: &str) -> Result<String, SecretError>;
    }
}

fn arg_is(actual: &str, expected: &str) -> bool {
    actual == expected
}

const PATH: &str = "/fit-in/300x300/images/cat.jpg";

fn enabled() -> SignatureConfig {
    SignatureConfig {
        enabled: true,
        secret_source_id: "image-handler".to_string(),
        secret_key_field: "signatureKey".to_string(),
    }
}

fn signed(signature: &str) -> HashMap<String, String> {
    HashMap::from([("signature".to_string(), signature.to_string())])
}

fn secrets_returning(secret: &'static str) -> MockSecrets {
    let mut secrets = MockSecrets::new();
    secrets
        .expect_get_secret()
        .withf(|id| arg_is(id, "image-handler"))
        .times(1)
        .returning(move |_| Ok(secret.to_string()));
    secrets
}

#[tokio::test]
async fn test_disabled_never_reads_secret() {
    let mut secrets = MockSecrets::new();
    secrets.expect_get_secret().times(0);

    let result = validate_signature(PATH, None, &SignatureConfig::default(), &secrets).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_missing_parameter_never_reads_secret() {
    let mut secrets = MockSecrets::new();
    secrets.expect_get_secret().times(0);

    let err = validate_signature(PATH, None, &enabled(), &secrets)
        .await
        .unwrap_err();
    assert_eq!(err.code, "AuthorizationQueryParametersError");
}

#[tokio::test]
async fn test_matching_signature() {
    let secrets = secrets_returning(r#"{"signatureKey":"s3cr3t"}"#);
    let signature = generate_signature(PATH, "s3cr3t").unwrap();

    let result = validate_signature(PATH, Some(&signed(&signature)), &enabled(), &secrets).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_signature_over_different_path_mismatches() {
    let secrets = secrets_returning(r#"{"signatureKey":"s3cr3t"}"#);
    let signature = generate_signature("/fit-in/300x300/images/dog.jpg", "s3cr3t").unwrap();

    let err = validate_signature(PATH, Some(&signed(&signature)), &enabled(), &secrets)
        .await
        .unwrap_err();
    assert_eq!(err.code, "SignatureDoesNotMatch");
    assert_eq!(err.status(), 403);
}

#[tokio::test]
async fn test_provider_error_is_opaque() {
    let mut secrets = MockSecrets::new();
    secrets
        .expect_get_secret()
        .times(1)
        .returning(|_| Err(SecretError::Provider("throttled".to_string())));

    let err = validate_signature(PATH, Some(&signed("abc")), &enabled(), &secrets)
        .await
        .unwrap_err();
    assert_eq!(err.code, "SignatureValidationFailure");
    assert_eq!(err.status(), 500);
    assert!(!err.message.contains("throttled"));
}
