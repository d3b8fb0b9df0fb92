//! Bounded wait for an authorized device.
//!
//! The classic behavior here is an infinite `devices`/sleep loop; this
//! version polls at a fixed interval but gives up after a configured
//! number of attempts so an unattended run can fail with a real error
//! instead of hanging forever.

use std::time::Duration;

use log::info;
use retry::OperationResult;
use retry::delay::Fixed;

use crate::adb::any_device_ready;
use crate::error::{Error, Result};

/// Poll `list_devices` every `interval` until some attached device
/// reports the `device` state, at most `max_attempts` times.
///
/// Returns the device listing of the first successful poll. States
/// like `unauthorized` or `offline` keep the loop going. A hard poll
/// failure (adb unspawnable) aborts immediately.
pub fn wait_for_device<F>(
    mut list_devices: F,
    interval: Duration,
    max_attempts: usize,
) -> Result<Vec<(String, String)>>
where
    F: FnMut() -> Result<Vec<(String, String)>>,
{
    let delays = Fixed::from_millis(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX))
        .take(max_attempts.saturating_sub(1));

    retry::retry(delays, || match list_devices() {
        Ok(devices) if any_device_ready(&devices) => OperationResult::Ok(devices),
        Ok(_) => {
            info!(
                "No Android device is connected. Retrying in {} seconds...",
                interval.as_secs()
            );
            OperationResult::Retry(None)
        }
        Err(Error::Adb { reason, .. }) => {
            // The server can report transient errors right after start
            info!("adb devices failed ({reason}), retrying...");
            OperationResult::Retry(None)
        }
        Err(e) => OperationResult::Err(Some(e)),
    })
    .map_err(|retry_err| match retry_err.error {
        Some(e) => e,
        None => Error::DeviceNotFound {
            attempts: usize::try_from(retry_err.tries).unwrap_or(usize::MAX),
        },
    })
}
