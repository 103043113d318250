//! Device capability traits: contexts, buffers, and ordered streams.
//!
//! The runner never talks to an accelerator API directly. It drives a
//! [`DeviceContext`], which hands out device-resident buffers and ordered
//! [`Stream`]s. Backends implement these traits; the transfer pipeline is
//! written once against them and is testable with no accelerator present.

use crate::error::{Result, RunnerError};
use std::time::Duration;

/// A device-resident allocation for one binding.
///
/// The buffer is owned by exactly one invocation and released when that
/// invocation's buffer set is dropped.
pub trait DeviceBuffer {
    /// Logical element count (32-bit floats) this buffer holds.
    fn element_count(&self) -> usize;

    /// Size of the allocation in bytes.
    fn byte_size(&self) -> u64 {
        (self.element_count() * std::mem::size_of::<f32>()) as u64
    }
}

/// An ordered queue of asynchronous device operations.
///
/// Operations enqueued on one stream execute in submission order relative
/// to each other, but asynchronously relative to the caller. Nothing is
/// guaranteed to have completed until [`Stream::synchronize`] returns:
/// readbacks enqueued with [`Stream::enqueue_readback`] become available
/// through [`Stream::take_readbacks`] only after a successful synchronize.
pub trait Stream {
    /// Device buffer type this stream transfers to and from.
    type Buffer: DeviceBuffer;

    /// Enqueue a host-to-device copy of the full buffer contents.
    ///
    /// # Errors
    /// Fails if the element counts of `host` and `device` differ, or on a
    /// backend transfer fault.
    fn copy_to_device(&mut self, host: &HostBuffer, device: &Self::Buffer) -> Result<()>;

    /// Enqueue a device-to-host readback of the full buffer contents.
    ///
    /// Completed readbacks are returned by [`Stream::take_readbacks`] in
    /// enqueue order after the next successful synchronize.
    fn enqueue_readback(&mut self, device: &Self::Buffer) -> Result<()>;

    /// Block until every operation enqueued so far has completed.
    ///
    /// # Errors
    /// Returns [`RunnerError::EngineTimeout`] if `timeout` is set and
    /// expires before the stream drains.
    fn synchronize(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Take the data of all completed readbacks, in enqueue order.
    fn take_readbacks(&mut self) -> Result<Vec<Vec<f32>>>;
}

/// An explicitly owned device resource.
///
/// Construction acquires the device; dropping the context releases it.
/// The context itself is read-only during invocations and may be shared:
/// concurrent invocations are safe as long as each owns its own stream
/// and buffer set.
pub trait DeviceContext {
    /// Device-resident buffer type.
    type Buffer: DeviceBuffer;
    /// Ordered stream type.
    type Stream: Stream<Buffer = Self::Buffer>;

    /// Allocate a host-resident staging buffer of `elements` floats.
    ///
    /// Backends with pinned host memory may override this to return
    /// page-locked storage; the default is plain zeroed memory.
    fn alloc_host(&self, elements: usize) -> Result<HostBuffer> {
        HostBuffer::zeroed(elements)
    }

    /// Allocate a device-resident buffer of `elements` floats.
    fn alloc_device(&self, elements: usize) -> Result<Self::Buffer>;

    /// Create a new ordered stream on this device.
    fn create_stream(&self) -> Result<Self::Stream>;
}

/// Host-resident staging memory for one binding.
///
/// Always allocated zeroed, with the exact element count of its paired
/// device buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBuffer {
    data: Vec<f32>,
}

impl HostBuffer {
    /// Allocate a zeroed host buffer.
    ///
    /// # Errors
    /// Returns [`RunnerError::Device`] if the host allocator cannot
    /// reserve the requested storage.
    pub fn zeroed(elements: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(elements).map_err(|e| {
            RunnerError::Device(format!("host allocation of {elements} elements failed: {e}"))
        })?;
        data.resize(elements, 0.0);
        Ok(Self { data })
    }

    /// Number of float elements this buffer holds.
    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    /// Read-only view of the buffer contents.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the buffer contents.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the buffer, yielding its storage.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
