//! Host/device buffer pair allocation.

use basalt_core::{Binding, DeviceBuffer, DeviceContext, HostBuffer, Result, RunnerError};

/// The matched host and device allocation for one binding.
///
/// Both sides always hold the same logical element count. The pair is
/// owned exclusively by the invocation that allocated it and is released
/// by drop when the invocation completes or fails.
pub struct BufferPair<D: DeviceContext> {
    /// Host-resident staging buffer.
    pub host: HostBuffer,
    /// Device-resident buffer of the same element count.
    pub device: D::Buffer,
}

impl<D: DeviceContext> BufferPair<D> {
    /// Element count shared by both sides of the pair.
    pub fn element_count(&self) -> usize {
        self.host.element_count()
    }
}

/// One `BufferPair` per binding, in binding order.
pub struct BufferSet<D: DeviceContext> {
    pairs: Vec<BufferPair<D>>,
}

impl<D: DeviceContext> BufferSet<D> {
    /// Allocate one host/device pair per binding, each sized
    /// `volume(shape) * batch_size` f32 elements.
    ///
    /// Allocation is all-or-nothing: the first failure aborts the set and
    /// drops every pair allocated so far. A half-allocated binding set is
    /// never returned.
    ///
    /// # Errors
    /// - [`RunnerError::InvalidBatchSize`] for `batch_size == 0`.
    /// - [`RunnerError::Allocation`] carrying the binding index and the
    ///   requested byte size, on a zero-volume shape (the resolver should
    ///   have rejected it already; re-validated here), on element-count
    ///   overflow, or on a host/device allocation fault.
    pub fn allocate(device: &D, bindings: &[Binding], batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(RunnerError::InvalidBatchSize(0));
        }

        let mut pairs = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let volume = binding.volume();
            if volume == 0 {
                return Err(RunnerError::Allocation {
                    binding: binding.index,
                    bytes: 0,
                    reason: format!("zero-volume shape {:?}", binding.shape),
                });
            }
            let elements = volume.checked_mul(batch_size).ok_or_else(|| {
                RunnerError::Allocation {
                    binding: binding.index,
                    bytes: u64::MAX,
                    reason: format!(
                        "element count overflow: volume {volume} at batch size {batch_size}"
                    ),
                }
            })?;
            let bytes = (elements * std::mem::size_of::<f32>()) as u64;

            tracing::debug!(
                binding = binding.index,
                elements,
                bytes,
                "allocating buffer pair"
            );

            let host = device
                .alloc_host(elements)
                .map_err(|e| allocation_error(binding.index, bytes, e))?;
            let dev = device
                .alloc_device(elements)
                .map_err(|e| allocation_error(binding.index, bytes, e))?;

            if dev.element_count() != host.element_count() {
                return Err(RunnerError::Device(format!(
                    "backend allocated {} device elements for binding {} but {} host elements",
                    dev.element_count(),
                    binding.index,
                    host.element_count()
                )));
            }

            pairs.push(BufferPair { host, device: dev });
        }

        Ok(Self { pairs })
    }

    /// Number of pairs, equal to the engine's binding count.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if the set holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pair for the binding at `index`.
    pub fn pair(&self, index: usize) -> &BufferPair<D> {
        &self.pairs[index]
    }

    /// Mutable pair for the binding at `index`.
    pub fn pair_mut(&mut self, index: usize) -> &mut BufferPair<D> {
        &mut self.pairs[index]
    }

    /// The full ordered device buffer list, inputs and outputs together,
    /// as handed to the engine.
    pub fn device_buffers(&self) -> Vec<&D::Buffer> {
        self.pairs.iter().map(|p| &p.device).collect()
    }
}

fn allocation_error(binding: usize, bytes: u64, source: RunnerError) -> RunnerError {
    RunnerError::Allocation {
        binding,
        bytes,
        reason: source.to_string(),
    }
}
