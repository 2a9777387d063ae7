use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, used as origin session id and version so
/// that a regenerated description gets a higher version.
pub fn unix_epoch_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
