//! Non-blocking sample handle
//!
//! A [`Sample`] pairs a completion fence with a getter that decodes the
//! result. Status is polled once per frame; the result can be taken exactly
//! once, and only after the fence has signalled. A sample that outlives its
//! lifetime before signalling times out for good. Dropping a sample releases
//! its fence and readback resources.

use std::time::{Duration, Instant};

/// Default time a sample may stay pending before it times out
pub const DEFAULT_SAMPLE_LIFETIME: Duration = Duration::from_millis(1000);

/// Default interval between status polls in [`Sample::wait`]
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(4);

/// Lifecycle of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Pending,
    Complete,
    Timeout,
}

/// Sampling errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("Sample is not complete yet")]
    NotReady,

    #[error("Sample timed out after {lifetime_ms} ms")]
    Timeout { lifetime_ms: u64 },

    #[error("Sample readback failed: {0}")]
    ReadbackFailed(String),

    #[error("Expected {expected} query points, got {actual}")]
    PointCountMismatch { expected: usize, actual: usize },
}

/// Completion signal of an asynchronous GPU (or CPU) operation
pub trait Fence: Send {
    /// Non-blocking check; may drive the device's completion callbacks
    fn is_signaled(&mut self) -> bool;
}

/// Fence that is signalled from the start
#[derive(Debug, Clone, Copy, Default)]
pub struct SignaledFence;

impl Fence for SignaledFence {
    fn is_signaled(&mut self) -> bool {
        true
    }
}

type Getter<T> = Box<dyn FnOnce() -> Result<T, SampleError> + Send>;

/// Handle to a result that becomes available later
pub struct Sample<T> {
    fence: Option<Box<dyn Fence>>,
    getter: Option<Getter<T>>,
    birth: Instant,
    lifetime: Duration,
    status: SampleStatus,
}

impl<T> Sample<T> {
    pub fn new(
        fence: Box<dyn Fence>,
        getter: impl FnOnce() -> Result<T, SampleError> + Send + 'static,
        lifetime: Duration,
    ) -> Self {
        Self::born_at(fence, getter, lifetime, Instant::now())
    }

    /// Sample whose lifetime is measured from `birth`
    pub fn born_at(
        fence: Box<dyn Fence>,
        getter: impl FnOnce() -> Result<T, SampleError> + Send + 'static,
        lifetime: Duration,
        birth: Instant,
    ) -> Self {
        Self {
            fence: Some(fence),
            getter: Some(Box::new(getter)),
            birth,
            lifetime,
            status: SampleStatus::Pending,
        }
    }

    /// Sample that is already complete
    pub fn ready(value: T) -> Self
    where
        T: Send + 'static,
    {
        Self::new(Box::new(SignaledFence), move || Ok(value), DEFAULT_SAMPLE_LIFETIME)
    }

    pub fn birth(&self) -> Instant {
        self.birth
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn status(&mut self) -> SampleStatus {
        self.status_at(Instant::now())
    }

    /// Status as of `now`
    ///
    /// `Complete` and `Timeout` are terminal: once reported they are
    /// reported forever.
    pub fn status_at(&mut self, now: Instant) -> SampleStatus {
        if self.status != SampleStatus::Pending {
            return self.status;
        }

        if now.saturating_duration_since(self.birth) > self.lifetime {
            self.status = SampleStatus::Timeout;
            self.fence = None;
            log::debug!("[Sample::status] timed out after {:?}", self.lifetime);
        } else if self.fence.as_mut().is_some_and(|fence| fence.is_signaled()) {
            self.status = SampleStatus::Complete;
        }
        self.status
    }

    /// Take the result, consuming the sample
    ///
    /// Fails with `NotReady` unless the last status check reported
    /// `Complete`.
    pub fn outcome(mut self) -> Result<T, SampleError> {
        match self.status {
            SampleStatus::Pending => Err(SampleError::NotReady),
            SampleStatus::Timeout => Err(SampleError::Timeout {
                lifetime_ms: self.lifetime.as_millis() as u64,
            }),
            SampleStatus::Complete => {
                self.fence = None;
                match self.getter.take() {
                    Some(getter) => getter(),
                    None => Err(SampleError::NotReady),
                }
            }
        }
    }

    /// Release the fence and readback resources without reading the result
    pub fn release(self) {
        drop(self);
    }

    /// Poll until complete or timed out
    pub async fn wait(mut self, poll_interval: Duration) -> Result<T, SampleError> {
        loop {
            match self.status() {
                SampleStatus::Pending => futures_timer::Delay::new(poll_interval).await,
                SampleStatus::Complete | SampleStatus::Timeout => return self.outcome(),
            }
        }
    }
}

impl<T> std::fmt::Debug for Sample<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("status", &self.status)
            .field("birth", &self.birth)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Fence flipped from the test body
    struct ManualFence(Arc<AtomicBool>);

    impl Fence for ManualFence {
        fn is_signaled(&mut self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn manual_sample(birth: Instant) -> (Sample<u32>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        let sample = Sample::born_at(
            Box::new(ManualFence(flag.clone())),
            || Ok(7),
            Duration::from_millis(1000),
            birth,
        );
        (sample, flag)
    }

    #[test]
    fn test_pending_until_signaled() {
        let birth = Instant::now();
        let (mut sample, flag) = manual_sample(birth);

        assert_eq!(sample.status_at(birth + Duration::from_millis(10)), SampleStatus::Pending);
        flag.store(true, Ordering::SeqCst);
        assert_eq!(sample.status_at(birth + Duration::from_millis(20)), SampleStatus::Complete);
        assert_eq!(sample.outcome(), Ok(7));
    }

    #[test]
    fn test_timeout_is_terminal() {
        let birth = Instant::now();
        let (mut sample, flag) = manual_sample(birth);

        assert_eq!(sample.status_at(birth + Duration::from_millis(999)), SampleStatus::Pending);
        assert_eq!(sample.status_at(birth + Duration::from_millis(1001)), SampleStatus::Timeout);

        // A late signal never turns a timed-out sample into a complete one
        flag.store(true, Ordering::SeqCst);
        assert_eq!(sample.status_at(birth + Duration::from_millis(1002)), SampleStatus::Timeout);
        assert_eq!(sample.outcome(), Err(SampleError::Timeout { lifetime_ms: 1000 }));
    }

    #[test]
    fn test_complete_is_terminal() {
        let birth = Instant::now();
        let (mut sample, flag) = manual_sample(birth);
        flag.store(true, Ordering::SeqCst);
        assert_eq!(sample.status_at(birth), SampleStatus::Complete);
        // Past the lifetime, still complete
        assert_eq!(sample.status_at(birth + Duration::from_secs(5)), SampleStatus::Complete);
    }

    #[test]
    fn test_outcome_before_complete_is_rejected() {
        let (sample, _flag) = manual_sample(Instant::now());
        assert_eq!(sample.outcome(), Err(SampleError::NotReady));
    }

    #[test]
    fn test_release_drops_getter() {
        let captured = Arc::new(());
        let witness = captured.clone();
        let sample: Sample<()> = Sample::new(
            Box::new(SignaledFence),
            move || {
                let _keep = &captured;
                Ok(())
            },
            DEFAULT_SAMPLE_LIFETIME,
        );
        assert_eq!(Arc::strong_count(&witness), 2);
        sample.release();
        assert_eq!(Arc::strong_count(&witness), 1);
    }

    #[test]
    fn test_wait_resolves_ready_sample() {
        let sample = Sample::ready(vec![1.0f32, 2.0]);
        let value = pollster::block_on(sample.wait(DEFAULT_POLL_INTERVAL)).unwrap();
        assert_eq!(value, vec![1.0, 2.0]);
    }

    #[test]
    fn test_wait_reports_timeout() {
        let flag = Arc::new(AtomicBool::new(false));
        let sample: Sample<u32> = Sample::new(
            Box::new(ManualFence(flag)),
            || Ok(1),
            Duration::from_millis(20),
        );
        let result = pollster::block_on(sample.wait(Duration::from_millis(5)));
        assert_eq!(result, Err(SampleError::Timeout { lifetime_ms: 20 }));
    }
}
