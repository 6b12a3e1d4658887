//! Object round-trip integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_roundtrip_object_with_md5_etag() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "roundtrip").await;

        let put = client
            .put_object()
            .bucket(&bucket)
            .key("hello.txt")
            .content_type("text/plain")
            .body(ByteStream::from_static(b"Hello World!"))
            .send()
            .await
            .expect("put_object");
        assert_eq!(
            put.e_tag(),
            Some("\"ed076287532e86365e841e92bfc50d8c\""),
            "ETag must be the MD5 of the body"
        );

        let get = client
            .get_object()
            .bucket(&bucket)
            .key("hello.txt")
            .send()
            .await
            .expect("get_object");
        assert_eq!(get.content_type(), Some("text/plain"));
        assert_eq!(get.content_length(), Some(12));

        let data = get.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"Hello World!");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_byte_ranges() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "range").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("hello.txt")
            .body(ByteStream::from_static(b"Hello World!"))
            .send()
            .await
            .expect("put_object");

        let get = client
            .get_object()
            .bucket(&bucket)
            .key("hello.txt")
            .range("bytes=5-7")
            .send()
            .await
            .expect("ranged get");
        assert_eq!(get.content_range(), Some("bytes 5-7/12"));
        assert_eq!(get.content_length(), Some(3));

        let data = get.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b" Wo");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_preserve_user_metadata() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "meta").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("tagged.bin")
            .metadata("color", "blue")
            .metadata("team", "storage")
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put_object");

        let head = client
            .head_object()
            .bucket(&bucket)
            .key("tagged.bin")
            .send()
            .await
            .expect("head_object");
        let metadata = head.metadata().expect("metadata map");
        assert_eq!(metadata.get("color").map(String::as_str), Some("blue"));
        assert_eq!(metadata.get("team").map(String::as_str), Some("storage"));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_copy_objects_between_buckets() {
        let client = s3_client();
        let src = create_test_bucket(&client, "copysrc").await;
        let dst = create_test_bucket(&client, "copydst").await;

        client
            .put_object()
            .bucket(&src)
            .key("original.txt")
            .body(ByteStream::from_static(b"copy me"))
            .send()
            .await
            .expect("put_object");

        client
            .copy_object()
            .bucket(&dst)
            .key("copied.txt")
            .copy_source(format!("{src}/original.txt"))
            .send()
            .await
            .expect("copy_object");

        let get = client
            .get_object()
            .bucket(&dst)
            .key("copied.txt")
            .send()
            .await
            .expect("get copy");
        let data = get.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"copy me");

        cleanup_bucket(&client, &src).await;
        cleanup_bucket(&client, &dst).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_idempotently_and_batch() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "delete").await;

        for key in ["a.txt", "b.txt"] {
            client
                .put_object()
                .bucket(&bucket)
                .key(key)
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .expect("put_object");
        }

        // Single delete twice: both succeed.
        client
            .delete_object()
            .bucket(&bucket)
            .key("a.txt")
            .send()
            .await
            .expect("first delete");
        client
            .delete_object()
            .bucket(&bucket)
            .key("a.txt")
            .send()
            .await
            .expect("second delete is idempotent");

        // Batch delete the rest.
        let delete = aws_sdk_s3::types::Delete::builder()
            .objects(
                aws_sdk_s3::types::ObjectIdentifier::builder()
                    .key("b.txt")
                    .build()
                    .expect("identifier"),
            )
            .build()
            .expect("delete");
        let resp = client
            .delete_objects()
            .bucket(&bucket)
            .delete(delete)
            .send()
            .await
            .expect("delete_objects");
        assert_eq!(resp.deleted().len(), 1);
        assert!(resp.errors().is_empty());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_no_such_key() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "missing").await;

        let result = client
            .get_object()
            .bucket(&bucket)
            .key("never-written")
            .send()
            .await;
        let err = result.expect_err("missing key");
        let service_err = err.into_service_error();
        assert!(service_err.is_no_such_key(), "expected NoSuchKey: {service_err}");

        cleanup_bucket(&client, &bucket).await;
    }
}
