//! Presigned URL integration tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aws_sdk_s3::presigning::PresigningConfig;
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_presigned_get_before_expiry() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "presign").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("shared.txt")
            .body(ByteStream::from_static(b"shared content"))
            .send()
            .await
            .expect("put_object");

        let presigned = client
            .get_object()
            .bucket(&bucket)
            .key("shared.txt")
            .presigned(
                PresigningConfig::expires_in(Duration::from_secs(300)).expect("presign config"),
            )
            .await
            .expect("presign");

        // Fetch without any signing headers: the URL carries the auth.
        let http = reqwest::Client::new();
        let resp = http
            .get(presigned.uri())
            .send()
            .await
            .expect("fetch presigned URL");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.bytes().await.expect("body").as_ref(), b"shared content");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_presigned_get_after_expiry() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "expired").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("shared.txt")
            .body(ByteStream::from_static(b"shared content"))
            .send()
            .await
            .expect("put_object");

        let presigned = client
            .get_object()
            .bucket(&bucket)
            .key("shared.txt")
            .presigned(PresigningConfig::expires_in(Duration::from_secs(1)).expect("config"))
            .await
            .expect("presign");

        tokio::time::sleep(Duration::from_secs(2)).await;

        let http = reqwest::Client::new();
        let resp = http
            .get(presigned.uri())
            .send()
            .await
            .expect("fetch expired URL");
        assert_eq!(resp.status(), 403);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_tampered_presigned_url() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "tamper").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("a.txt")
            .body(ByteStream::from_static(b"a"))
            .send()
            .await
            .expect("put a");
        client
            .put_object()
            .bucket(&bucket)
            .key("b.txt")
            .body(ByteStream::from_static(b"b"))
            .send()
            .await
            .expect("put b");

        let presigned = client
            .get_object()
            .bucket(&bucket)
            .key("a.txt")
            .presigned(PresigningConfig::expires_in(Duration::from_secs(300)).expect("config"))
            .await
            .expect("presign");

        // Point the signed URL at a different key.
        let tampered = presigned.uri().replace("a.txt", "b.txt");
        let http = reqwest::Client::new();
        let resp = http.get(&tampered).send().await.expect("fetch tampered URL");
        assert_eq!(resp.status(), 403);

        cleanup_bucket(&client, &bucket).await;
    }
}
