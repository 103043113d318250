//! CPU reference device.
//!
//! `HostDevice` implements the device capability traits with plain host
//! memory and an eagerly executing stream: submission order is execution
//! order, so the in-order stream contract holds trivially. It exists so
//! the transfer pipeline can run and be tested with no accelerator
//! present, and it doubles as the fault-injection point for allocation
//! and timeout error paths.

use basalt_core::{
    DeviceBuffer, DeviceContext, HostBuffer, Result, RunnerError, Stream,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared counters so tests can observe the device from outside.
#[derive(Debug, Default)]
struct HostCounters {
    live_device_buffers: AtomicUsize,
    host_to_device_copies: AtomicUsize,
    device_to_host_copies: AtomicUsize,
}

/// CPU device context.
///
/// Cloning yields another handle to the same device; counters and the
/// injected-failure budget are shared.
#[derive(Debug, Clone, Default)]
pub struct HostDevice {
    counters: Arc<HostCounters>,
    // Remaining successful device allocations before injected failure.
    alloc_budget: Arc<Mutex<Option<usize>>>,
    sync_delay: Option<Duration>,
}

impl HostDevice {
    /// A device with no injected faults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A device whose device-buffer allocator succeeds `n` times and
    /// fails on every allocation after that.
    pub fn failing_after(n: usize) -> Self {
        Self {
            alloc_budget: Arc::new(Mutex::new(Some(n))),
            ..Self::default()
        }
    }

    /// Pretend every synchronize takes `delay` of device time, so bounded
    /// waits shorter than it report a timeout.
    pub fn with_sync_delay(mut self, delay: Duration) -> Self {
        self.sync_delay = Some(delay);
        self
    }

    /// Device buffers currently alive. Zero once every invocation has
    /// released its buffer set.
    pub fn live_device_buffers(&self) -> usize {
        self.counters.live_device_buffers.load(Ordering::SeqCst)
    }

    /// Host-to-device copies executed so far.
    pub fn host_to_device_copies(&self) -> usize {
        self.counters.host_to_device_copies.load(Ordering::SeqCst)
    }

    /// Device-to-host readbacks executed so far.
    pub fn device_to_host_copies(&self) -> usize {
        self.counters.device_to_host_copies.load(Ordering::SeqCst)
    }
}

impl DeviceContext for HostDevice {
    type Buffer = HostDeviceBuffer;
    type Stream = HostStream;

    fn alloc_device(&self, elements: usize) -> Result<Self::Buffer> {
        if let Some(budget) = self.alloc_budget.lock().unwrap().as_mut() {
            if *budget == 0 {
                return Err(RunnerError::Device(
                    "injected device allocation failure".to_string(),
                ));
            }
            *budget -= 1;
        }
        self.counters
            .live_device_buffers
            .fetch_add(1, Ordering::SeqCst);
        Ok(HostDeviceBuffer {
            data: Arc::new(Mutex::new(vec![0.0; elements])),
            counters: Arc::clone(&self.counters),
        })
    }

    fn create_stream(&self) -> Result<Self::Stream> {
        Ok(HostStream {
            counters: Arc::clone(&self.counters),
            sync_delay: self.sync_delay,
            completed: Vec::new(),
        })
    }
}

/// "Device"-resident buffer backed by host memory.
///
/// Shared mutability lets an engine write outputs while the invocation
/// still holds the handle, mirroring how a real device buffer is a
/// pointer the engine scribbles through.
#[derive(Debug)]
pub struct HostDeviceBuffer {
    data: Arc<Mutex<Vec<f32>>>,
    counters: Arc<HostCounters>,
}

impl HostDeviceBuffer {
    /// Snapshot the buffer contents.
    pub fn read(&self) -> Vec<f32> {
        self.data.lock().unwrap().clone()
    }

    /// Overwrite the buffer contents. Used by engine implementations to
    /// populate output bindings.
    ///
    /// # Errors
    /// Fails if `values` does not match the buffer's element count.
    pub fn write(&self, values: &[f32]) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        if values.len() != data.len() {
            return Err(RunnerError::Execution(format!(
                "engine wrote {} elements into a {}-element buffer",
                values.len(),
                data.len()
            )));
        }
        data.copy_from_slice(values);
        Ok(())
    }
}

impl DeviceBuffer for HostDeviceBuffer {
    fn element_count(&self) -> usize {
        self.data.lock().unwrap().len()
    }
}

impl Drop for HostDeviceBuffer {
    fn drop(&mut self) {
        self.counters
            .live_device_buffers
            .fetch_sub(1, Ordering::SeqCst);
    }
}

/// Eagerly executing stream: each enqueued operation runs immediately,
/// which preserves submission order by construction.
#[derive(Debug)]
pub struct HostStream {
    counters: Arc<HostCounters>,
    sync_delay: Option<Duration>,
    completed: Vec<Vec<f32>>,
}

impl Stream for HostStream {
    type Buffer = HostDeviceBuffer;

    fn copy_to_device(&mut self, host: &HostBuffer, device: &Self::Buffer) -> Result<()> {
        let mut data = device.data.lock().unwrap();
        if host.element_count() != data.len() {
            return Err(RunnerError::Device(format!(
                "host-to-device copy of {} elements into a {}-element buffer",
                host.element_count(),
                data.len()
            )));
        }
        data.copy_from_slice(host.as_slice());
        self.counters
            .host_to_device_copies
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn enqueue_readback(&mut self, device: &Self::Buffer) -> Result<()> {
        // Prior stream work has already executed, so the device contents
        // are final here.
        self.completed.push(device.read());
        self.counters
            .device_to_host_copies
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn synchronize(&mut self, timeout: Option<Duration>) -> Result<()> {
        if let (Some(delay), Some(bound)) = (self.sync_delay, timeout) {
            if delay > bound {
                return Err(RunnerError::EngineTimeout { waited: bound });
            }
        }
        Ok(())
    }

    fn take_readbacks(&mut self) -> Result<Vec<Vec<f32>>> {
        Ok(std::mem::take(&mut self.completed))
    }
}
