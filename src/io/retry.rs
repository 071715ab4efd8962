//! Fixed-attempt, fixed-delay retry for transient filesystem failures.
use std::io::ErrorKind;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Sleep between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// Filesystem errors worth another attempt. Lock contention from concurrent
/// readers surfaces as `PermissionDenied`.
pub fn is_transient_io(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::PermissionDenied | ErrorKind::ResourceBusy)
}

/// Run `op` until it succeeds, fails with a non-transient error, or the policy is
/// exhausted. `on_retry` is called with the failed attempt number before sleeping.
pub fn retry_with<T, E, F, P, N>(policy: RetryPolicy, is_transient: P, mut on_retry: N, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    N: FnMut(u32, &E),
{
    let mut attempt = 1;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.attempts && is_transient(&e) => {
                on_retry(attempt, &e);
                if !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// [`retry_with`] without a retry callback.
pub fn retry<T, E, F, P>(policy: RetryPolicy, is_transient: P, op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
{
    retry_with(policy, is_transient, |_, _| {}, op)
}
