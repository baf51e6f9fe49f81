pub mod traits;
pub mod web;

pub use traits::{PageDriver, SessionFactory};

use crate::utils::config::Config;
use anyhow::Result;
use std::sync::Arc;

/// Launch the configured browser and return a factory for per-scenario sessions
pub async fn launch(config: &Config) -> Result<Arc<dyn SessionFactory>> {
    let web_config = web::WebDriverConfig {
        browser_type: config.browser,
        headless: config.headless,
        base_url: config.base_url.clone(),
        action_timeout_ms: config.action_timeout_ms,
        navigation_timeout_ms: config.navigation_timeout_ms,
        viewport_width: config.viewport_width,
        viewport_height: config.viewport_height,
        ..web::WebDriverConfig::default()
    };

    let factory = web::WebSessionFactory::launch(web_config).await?;
    Ok(Arc::new(factory))
}
