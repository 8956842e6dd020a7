//! Bounded retry for transient collaborator failures.

use std::thread;

use tracing::warn;

use stockcast_core::RetryConfig;

/// Run `op`, retrying transient failures up to `policy.max_retries` times
/// with a fixed pause between attempts.
///
/// `is_transient` decides whether a failure is worth another attempt;
/// permanent failures return immediately. The last error is returned once
/// attempts are exhausted.
pub fn with_retry<T, E>(
    policy: &RetryConfig,
    is_transient: impl Fn(&E) -> bool,
    mut op: impl FnMut() -> Result<T, E>,
) -> Result<T, E>
where
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_retries && is_transient(&err) => {
                attempt += 1;
                warn!(attempt, error = %err, "transient failure, retrying");
                thread::sleep(policy.backoff());
            }
            Err(err) => return Err(err),
        }
    }
}
