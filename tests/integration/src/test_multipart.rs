//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
    use md5::Digest;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_complete_multipart_upload_with_composite_etag() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("big/file.bin")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = create.upload_id().expect("upload_id");

        // Upload out of order: part 2 first.
        let part2 = client
            .upload_part()
            .bucket(&bucket)
            .key("big/file.bin")
            .upload_id(upload_id)
            .part_number(2)
            .body(ByteStream::from_static(b"BBBB"))
            .send()
            .await
            .expect("upload part 2");
        let part1 = client
            .upload_part()
            .bucket(&bucket)
            .key("big/file.bin")
            .upload_id(upload_id)
            .part_number(1)
            .body(ByteStream::from_static(b"AAAA"))
            .send()
            .await
            .expect("upload part 1");

        assert_eq!(part1.e_tag(), Some("\"e2fc714c4727ee9395f324cd2e7f331f\""));
        assert_eq!(part2.e_tag(), Some("\"f6a6263167c92de8644ac998b3c4e4d1\""));

        let completed = CompletedMultipartUpload::builder()
            .parts(
                CompletedPart::builder()
                    .part_number(1)
                    .e_tag(part1.e_tag().unwrap_or_default())
                    .build(),
            )
            .parts(
                CompletedPart::builder()
                    .part_number(2)
                    .e_tag(part2.e_tag().unwrap_or_default())
                    .build(),
            )
            .build();

        let complete = client
            .complete_multipart_upload()
            .bucket(&bucket)
            .key("big/file.bin")
            .upload_id(upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .expect("complete_multipart_upload");

        // The composite ETag: md5 over the binary part digests, "-2" suffix.
        let mut combined = hex::decode("e2fc714c4727ee9395f324cd2e7f331f").expect("hex");
        combined.extend(hex::decode("f6a6263167c92de8644ac998b3c4e4d1").expect("hex"));
        let expected = format!("\"{}-2\"", hex::encode(md5::Md5::digest(&combined)));
        assert_eq!(complete.e_tag(), Some(expected.as_str()));

        let get = client
            .get_object()
            .bucket(&bucket)
            .key("big/file.bin")
            .send()
            .await
            .expect("get assembled object");
        let data = get.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"AAAABBBB");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_overwrite_retried_part() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "retry").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("retry.bin")
            .send()
            .await
            .expect("create");
        let upload_id = create.upload_id().expect("upload_id");

        for body in [&b"first"[..], &b"second-attempt"[..]] {
            client
                .upload_part()
                .bucket(&bucket)
                .key("retry.bin")
                .upload_id(upload_id)
                .part_number(1)
                .body(ByteStream::from(body.to_vec()))
                .send()
                .await
                .expect("upload part");
        }

        let parts = client
            .list_parts()
            .bucket(&bucket)
            .key("retry.bin")
            .upload_id(upload_id)
            .send()
            .await
            .expect("list_parts");
        assert_eq!(parts.parts().len(), 1, "retried part overwrites in place");
        assert_eq!(parts.parts()[0].size(), Some(14));

        client
            .abort_multipart_upload()
            .bucket(&bucket)
            .key("retry.bin")
            .upload_id(upload_id)
            .send()
            .await
            .expect("abort");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_abort_and_forget_upload() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "abort").await;

        let create = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("aborted.bin")
            .send()
            .await
            .expect("create");
        let upload_id = create.upload_id().expect("upload_id");

        client
            .upload_part()
            .bucket(&bucket)
            .key("aborted.bin")
            .upload_id(upload_id)
            .part_number(1)
            .body(ByteStream::from_static(b"will be aborted"))
            .send()
            .await
            .expect("upload part");

        client
            .abort_multipart_upload()
            .bucket(&bucket)
            .key("aborted.bin")
            .upload_id(upload_id)
            .send()
            .await
            .expect("abort");

        let result = client
            .get_object()
            .bucket(&bucket)
            .key("aborted.bin")
            .send()
            .await;
        assert!(result.is_err(), "aborted upload key should not exist");

        let result = client
            .upload_part()
            .bucket(&bucket)
            .key("aborted.bin")
            .upload_id(upload_id)
            .part_number(2)
            .body(ByteStream::from_static(b"late"))
            .send()
            .await;
        assert!(result.is_err(), "upload id is gone after abort");

        cleanup_bucket(&client, &bucket).await;
    }
}
