//! Image URL probe

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, instrument};
use trellox_config::ImportSettings;

/// Checks that a URL serves an image with a HEAD request
#[derive(Debug, Clone)]
pub struct ImageProbe {
    client: Client,
}

impl ImageProbe {
    pub fn new(settings: &ImportSettings) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| crate::ImportError::Network {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// True only for a success status with an `image/*` content type
    #[instrument(skip(self))]
    pub async fn is_valid_image_url(&self, url: &str) -> bool {
        let response = match self.client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("image probe failed: {}", e);
                return false;
            }
        };
        if !response.status().is_success() {
            debug!("image probe answered {}", response.status());
            return false;
        }
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().to_ascii_lowercase().starts_with("image/"))
    }
}
