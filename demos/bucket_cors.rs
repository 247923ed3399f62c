use std::time::Duration;

use oss::{ClientBuilder, CorsRule};

#[allow(clippy::result_large_err)]
#[tokio::main]
async fn main() -> Result<(), oss::Error> {
    if std::env::var("OSS_ENDPOINT").is_err() || std::env::var("OSS_BUCKET").is_err() {
        eprintln!("Set OSS_ENDPOINT and OSS_BUCKET to run this example.");
        return Ok(());
    }

    let client = ClientBuilder::from_env()?.build()?;
    let buckets = client.buckets();
    let bucket = buckets.default_bucket()?;

    buckets
        .put_cors(
            &bucket,
            vec![
                CorsRule::new("*", ["GET", "HEAD"])
                    .allowed_header("*")
                    .expose_header(["ETag", "x-oss-request-id"])
                    .max_age_seconds(600),
            ],
        )
        .timeout(Duration::from_secs(10))
        .send()
        .await?;

    for rule in buckets.get_cors(&bucket).send().await?.rules {
        println!(
            "origins={:?} methods={:?} max_age={:?}",
            rule.allowed_origin, rule.allowed_method, rule.max_age_seconds
        );
    }

    buckets.delete_cors(&bucket).send().await?;
    Ok(())
}
