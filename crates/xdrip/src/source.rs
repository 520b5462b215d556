use async_trait::async_trait;
use diabuddy_core::Reading;

/// Anything that can produce the latest glucose reading.
///
/// `None` means no data was available this time. It is a normal
/// outcome, not an error, and callers retry on their own schedule.
#[async_trait]
pub trait GlucoseSource: Send + Sync {
    async fn fetch_latest(&self) -> Option<Reading>;
}
