//! Listing integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    async fn put_keys(client: &aws_sdk_s3::Client, bucket: &str, keys: &[&str]) {
        for key in keys {
            client
                .put_object()
                .bucket(bucket)
                .key(*key)
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .unwrap_or_else(|e| panic!("put {key}: {e}"));
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_partition_keys_with_delimiter() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "delim").await;
        put_keys(&client, &bucket, &["a/b", "a/c", "d"]).await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .delimiter("/")
            .send()
            .await
            .expect("list_objects_v2");

        let keys: Vec<_> = resp.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, vec!["d"]);

        let prefixes: Vec<_> = resp
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .collect();
        assert_eq!(prefixes, vec!["a/"]);
        assert_eq!(resp.key_count(), Some(2));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_filter_by_prefix() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "prefix").await;
        put_keys(&client, &bucket, &["logs/1.txt", "logs/2.txt", "data/3.txt"]).await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .prefix("logs/")
            .send()
            .await
            .expect("list_objects_v2");

        let keys: Vec<_> = resp.contents().iter().filter_map(|o| o.key()).collect();
        assert_eq!(keys, vec!["logs/1.txt", "logs/2.txt"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_paginate_with_continuation_tokens() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "page").await;
        put_keys(&client, &bucket, &["a", "b", "c", "d", "e"]).await;

        let mut collected = Vec::new();
        let mut token = None;
        loop {
            let mut req = client.list_objects_v2().bucket(&bucket).max_keys(2);
            if let Some(t) = token.take() {
                req = req.continuation_token(t);
            }
            let resp = req.send().await.expect("page");
            collected.extend(
                resp.contents()
                    .iter()
                    .filter_map(|o| o.key())
                    .map(ToOwned::to_owned),
            );
            if resp.is_truncated() == Some(true) {
                token = resp.next_continuation_token().map(ToOwned::to_owned);
            } else {
                break;
            }
        }

        assert_eq!(collected, vec!["a", "b", "c", "d", "e"]);

        cleanup_bucket(&client, &bucket).await;
    }
}
