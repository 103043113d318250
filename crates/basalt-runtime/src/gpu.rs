//! wgpu-backed device context.
//!
//! Maps the device capability traits onto wgpu: device buffers are
//! storage buffers, and the stream is the submission-ordered queue. A
//! [`WgpuStream`] batches work into one command encoder; uploads go
//! through `Queue::write_buffer`, which is ordered before any command
//! buffer submitted afterwards, so the stream contract holds. Readbacks
//! are staged into `MAP_READ` buffers and mapped at synchronize time.

use basalt_core::{DeviceBuffer, DeviceContext, HostBuffer, Result, RunnerError, Stream};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// GPU device context over a wgpu device and queue.
///
/// Construction acquires the adapter and device explicitly; dropping the
/// context releases them. Safe to construct more than once per process.
pub struct WgpuContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_info: wgpu::AdapterInfo,
}

impl WgpuContext {
    /// Initialize with the default high-performance adapter.
    ///
    /// # Errors
    /// Returns an error if no suitable GPU is found or device creation
    /// fails.
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RunnerError::Device(format!("no suitable GPU adapter: {e}")))?;

        Self::with_adapter(&adapter).await
    }

    /// Initialize on a specific adapter, for multi-GPU systems.
    ///
    /// # Errors
    /// Returns an error if device creation fails.
    pub async fn with_adapter(adapter: &wgpu::Adapter) -> Result<Self> {
        let adapter_info = adapter.get_info();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .map_err(|e| RunnerError::Device(format!("failed to create device: {e}")))?;

        tracing::info!(name = %adapter_info.name, backend = ?adapter_info.backend, "GPU device ready");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info,
        })
    }

    /// Information about the adapter backing this context.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// The underlying wgpu device, for engine implementations.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// The underlying wgpu queue, for engine implementations.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

impl DeviceContext for WgpuContext {
    type Buffer = WgpuBuffer;
    type Stream = WgpuStream;

    fn alloc_device(&self, elements: usize) -> Result<Self::Buffer> {
        let size = (elements * std::mem::size_of::<f32>()) as u64;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("binding buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        Ok(WgpuBuffer { buffer, elements })
    }

    fn create_stream(&self) -> Result<Self::Stream> {
        Ok(WgpuStream {
            device: Arc::clone(&self.device),
            queue: Arc::clone(&self.queue),
            encoder: None,
            pending: Vec::new(),
            completed: Vec::new(),
        })
    }
}

/// Device-resident storage buffer with its logical element count.
#[derive(Debug)]
pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
    elements: usize,
}

impl WgpuBuffer {
    /// The underlying wgpu buffer, for engine implementations.
    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl DeviceBuffer for WgpuBuffer {
    fn element_count(&self) -> usize {
        self.elements
    }
}

/// Submission-ordered stream over the wgpu queue.
pub struct WgpuStream {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    encoder: Option<wgpu::CommandEncoder>,
    // Staging buffers for enqueued readbacks, in enqueue order.
    pending: Vec<(wgpu::Buffer, usize)>,
    completed: Vec<Vec<f32>>,
}

impl WgpuStream {
    /// Command encoder for engine implementations to record work into.
    ///
    /// Everything recorded here is submitted at the next synchronize,
    /// after all uploads enqueued so far.
    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder.get_or_insert_with(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("stream encoder"),
                })
        })
    }
}

impl Stream for WgpuStream {
    type Buffer = WgpuBuffer;

    fn copy_to_device(&mut self, host: &HostBuffer, device: &Self::Buffer) -> Result<()> {
        if host.element_count() != device.element_count() {
            return Err(RunnerError::Device(format!(
                "host-to-device copy of {} elements into a {}-element buffer",
                host.element_count(),
                device.element_count()
            )));
        }
        // Ordered before any command buffer submitted after this point.
        self.queue
            .write_buffer(&device.buffer, 0, bytemuck::cast_slice(host.as_slice()));
        Ok(())
    }

    fn enqueue_readback(&mut self, device: &Self::Buffer) -> Result<()> {
        let size = device.byte_size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.encoder()
            .copy_buffer_to_buffer(&device.buffer, 0, &staging, 0, size);
        self.pending.push((staging, device.element_count()));
        Ok(())
    }

    fn synchronize(&mut self, timeout: Option<Duration>) -> Result<()> {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }

        let mut receivers = Vec::with_capacity(self.pending.len());
        for (staging, _) in &self.pending {
            let (sender, receiver) = mpsc::channel();
            staging
                .slice(..)
                .map_async(wgpu::MapMode::Read, move |result| {
                    sender.send(result).ok();
                });
            receivers.push(receiver);
        }

        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| RunnerError::Device(format!("device poll failed: {e}")))?;

        for receiver in receivers {
            let mapped = match timeout {
                Some(bound) => receiver
                    .recv_timeout(bound)
                    .map_err(|_| RunnerError::EngineTimeout { waited: bound })?,
                None => receiver
                    .recv()
                    .map_err(|_| RunnerError::Device("map callback dropped".to_string()))?,
            };
            mapped.map_err(|e| RunnerError::Device(format!("buffer map failed: {e}")))?;
        }

        for (staging, elements) in self.pending.drain(..) {
            let data: Vec<f32> = {
                let view = staging.slice(..).get_mapped_range();
                bytemuck::pod_collect_to_vec(&view)
            };
            staging.unmap();
            debug_assert_eq!(data.len(), elements);
            self.completed.push(data);
        }

        Ok(())
    }

    fn take_readbacks(&mut self) -> Result<Vec<Vec<f32>>> {
        Ok(std::mem::take(&mut self.completed))
    }
}
