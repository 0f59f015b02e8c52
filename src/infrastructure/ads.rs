use crate::domain::reply::AdPresenter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Ad surface of one HTTP request.
///
/// Ads play on the device, so a rewarded ad counts as watched when the client
/// reports it, and an interstitial is handed back for the client to show.
#[derive(Debug, Default)]
pub struct ClientAdReceipt {
    ad_watched: bool,
    interstitial_requested: AtomicBool,
}

impl ClientAdReceipt {
    pub fn new(ad_watched: bool) -> Self {
        Self {
            ad_watched,
            interstitial_requested: AtomicBool::new(false),
        }
    }

    pub fn interstitial_requested(&self) -> bool {
        self.interstitial_requested.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AdPresenter for ClientAdReceipt {
    async fn show_rewarded_ad(&self) -> bool {
        tracing::debug!(ad_watched = self.ad_watched, "Rewarded ad gate reached");
        self.ad_watched
    }

    fn show_interstitial_ad(&self) {
        self.interstitial_requested.store(true, Ordering::Relaxed);
    }
}
