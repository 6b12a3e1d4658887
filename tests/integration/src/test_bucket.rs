//! Bucket lifecycle integration tests.

#[cfg(test)]
mod tests {
    use crate::{cleanup_bucket, create_test_bucket, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_head_and_delete_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "lifecycle").await;

        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("head_bucket after create");

        client
            .delete_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete empty bucket");

        let result = client.head_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "bucket should be gone after delete");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_invalid_and_duplicate_names() {
        let client = s3_client();

        let result = client.create_bucket().bucket("TEST-Bucket").send().await;
        assert!(result.is_err(), "uppercase names are invalid");

        let bucket = create_test_bucket(&client, "dup").await;
        let result = client.create_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "duplicate create must conflict");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_deleting_nonempty_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nonempty").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("blocker.txt")
            .body(aws_sdk_s3::primitives::ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put object");

        let result = client.delete_bucket().bucket(&bucket).send().await;
        assert!(result.is_err(), "delete of non-empty bucket must fail");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_location_and_versioning() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "subres").await;

        client
            .get_bucket_location()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_location");

        let versioning = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_versioning");
        assert!(versioning.status().is_none(), "versioning is never enabled");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_created_buckets() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "listed").await;

        let resp = client.list_buckets().send().await.expect("list_buckets");
        let names: Vec<_> = resp
            .buckets()
            .iter()
            .filter_map(|b| b.name())
            .collect();
        assert!(names.contains(&bucket.as_str()));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_404_for_missing_bucket() {
        let client = s3_client();
        let result = client
            .head_bucket()
            .bucket(test_bucket_name("ghost"))
            .send()
            .await;
        assert!(result.is_err());
    }
}
