// Origin fetch behaviour against a mocked object store

use async_trait::async_trait;
use image_request::request::origin::fetch_origin;
use image_request::storage::{ObjectStore, OriginObject, StorageError};
use mockall::{mock, Sequence};

mock! {
    pub Store {}

    #[async_trait]
    impl ObjectStore for Store {
        async fn get_object(&self, bucket: &str, key: &str) -> Result<OriginObject, StorageError>;
    }
}

const JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xDB];

fn arg_is(actual: &str, expected: &str) -> bool {
    actual == expected
}

#[tokio::test]
async fn test_found_object_fetched_once() {
    let mut store = MockStore::new();
    store
        .expect_get_object()
        .withf(|bucket, key| arg_is(bucket, "images-bucket") && arg_is(key, "images/photo.jpg"))
        .times(1)
        .returning(|_, _| Ok(OriginObject::new(JPEG.to_vec()).with_content_type("image/jpeg")));

    let image = fetch_origin(&store, "images-bucket", "images/photo.jpg")
        .await
        .unwrap();
    assert_eq!(image.content_type, "image/jpeg");
}

#[tokio::test]
async fn test_missing_object_retries_default_image_once() {
    let mut store = MockStore::new();
    let mut seq = Sequence::new();
    store
        .expect_get_object()
        .withf(|_, key| arg_is(key, "images/photo.jpg"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, key| Err(StorageError::no_such_key(key)));
    store
        .expect_get_object()
        .withf(|bucket, key| arg_is(bucket, "images-bucket") && arg_is(key, "images/default.jpg"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| {
            Ok(OriginObject::new(JPEG.to_vec()).with_content_type("binary/octet-stream"))
        });

    let image = fetch_origin(&store, "images-bucket", "images/photo.jpg")
        .await
        .unwrap();
    assert_eq!(image.content_type, "image/jpeg");
}

#[tokio::test]
async fn test_missing_default_image_is_not_found() {
    let mut store = MockStore::new();
    store
        .expect_get_object()
        .times(2)
        .returning(|_, key| Err(StorageError::no_such_key(key)));

    let err = fetch_origin(&store, "images-bucket", "images/photo.jpg")
        .await
        .unwrap_err();
    assert_eq!(err.code, "NoSuchKey");
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_access_denied_is_not_retried() {
    let mut store = MockStore::new();
    store
        .expect_get_object()
        .times(1)
        .returning(|_, _| Err(StorageError::new("AccessDenied", "Access Denied").with_status(403)));

    let err = fetch_origin(&store, "images-bucket", "images/photo.jpg")
        .await
        .unwrap_err();
    assert_eq!(err.code, "AccessDenied");
    assert_eq!(err.status(), 500);
}
