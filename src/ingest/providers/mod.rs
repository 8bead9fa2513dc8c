pub mod gdelt;
pub mod google_news;

use anyhow::Result;
use std::time::Duration;

use crate::config::app::NewsConfig;
use crate::ingest::types::NewsProvider;

/// Build the live provider set in merge order: Google News first, GDELT second.
pub fn from_config(cfg: &NewsConfig, timeout: Duration) -> Result<Vec<Box<dyn NewsProvider>>> {
    Ok(vec![
        Box::new(google_news::GoogleNewsProvider::from_url(
            &cfg.google_news_base_url,
            timeout,
            cfg.lookback_days,
        )?),
        Box::new(gdelt::GdeltProvider::from_url(
            &cfg.gdelt_base_url,
            timeout,
            cfg.lookback_days,
            cfg.gdelt_max_records,
        )?),
    ])
}
