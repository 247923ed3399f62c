use oss::ClientBuilder;

#[allow(clippy::result_large_err)]
#[tokio::main]
async fn main() -> Result<(), oss::Error> {
    if std::env::var("OSS_ENDPOINT").is_err() {
        eprintln!("Set OSS_ENDPOINT to run this example (e.g. https://oss-cn-hangzhou.aliyuncs.com).");
        return Ok(());
    }

    let client = ClientBuilder::from_env()?.build()?;

    let mut marker: Option<String> = None;
    loop {
        let mut request = client.buckets().list().max_keys(100);
        if let Some(m) = marker.take() {
            request = request.marker(m);
        }

        let page = request.send().await?;
        for bucket in page.buckets.unwrap_or_default() {
            println!(
                "{}\t{}\t{}",
                bucket.name,
                bucket.region.unwrap_or_default(),
                bucket.storage_class.unwrap_or_default()
            );
        }

        if !page.is_truncated {
            break;
        }
        marker = page.next_marker;
        if marker.is_none() {
            break;
        }
    }

    Ok(())
}
