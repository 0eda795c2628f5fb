//! Readback fences
//!
//! wgpu has no fence objects; completion of a submission is observed
//! through `map_async` on a staging buffer copied at the end of it. The
//! fence polls the device without blocking and records the map result,
//! which the sample's getter checks before touching the mapped range.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::ocean::sampler::{Fence, Sample, SampleError};

type MapResult = Option<Result<(), String>>;

/// Signalled once the staging buffer's `map_async` has completed
pub struct MapFence {
    device: Arc<wgpu::Device>,
    receiver: flume::Receiver<Result<(), wgpu::BufferAsyncError>>,
    state: Arc<Mutex<MapResult>>,
}

impl Fence for MapFence {
    fn is_signaled(&mut self) -> bool {
        if self.state.lock().is_some() {
            return true;
        }

        self.device.poll(wgpu::Maintain::Poll);
        let result = match self.receiver.try_recv() {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(flume::TryRecvError::Empty) => return false,
            Err(flume::TryRecvError::Disconnected) => Err("map callback dropped".to_string()),
        };
        *self.state.lock() = Some(result);
        true
    }
}

/// Start mapping `staging` and wrap it into a [`Sample`] whose getter
/// decodes the mapped bytes with `decode`
///
/// `staging` must already have been written by a submitted copy. The
/// sample owns the buffer; dropping the sample frees it.
pub fn map_read_sample<T, F>(
    device: Arc<wgpu::Device>,
    staging: wgpu::Buffer,
    lifetime: Duration,
    decode: F,
) -> Sample<T>
where
    T: 'static,
    F: FnOnce(&[u8]) -> T + Send + 'static,
{
    let (sender, receiver) = flume::bounded(1);
    staging
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

    let state: Arc<Mutex<MapResult>> = Arc::new(Mutex::new(None));
    let fence = MapFence {
        device,
        receiver,
        state: state.clone(),
    };

    let getter = move || {
        let mapped = state.lock().clone();
        match mapped {
            Some(Ok(())) => {
                let data = staging.slice(..).get_mapped_range();
                let value = decode(&data);
                drop(data);
                staging.unmap();
                Ok(value)
            }
            Some(Err(error)) => Err(SampleError::ReadbackFailed(error)),
            None => Err(SampleError::NotReady),
        }
    };

    Sample::new(Box::new(fence), getter, lifetime)
}
