use std::sync::Arc;

use tib_core::{config::Config, pipeline::IssuePipeline};
use tib_tracker::TrackerClient;

#[tokio::main]
async fn main() -> Result<(), tib_core::Error> {
    tib_core::logging::init("tib")?;

    let cfg = Arc::new(Config::load()?);

    let tracker = Arc::new(TrackerClient::new(&cfg));
    let pipeline = Arc::new(IssuePipeline::new(&cfg, tracker));

    tib_telegram::router::run_polling(cfg, pipeline)
        .await
        .map_err(|e| tib_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
