//! The stream-ordered transfer pipeline.
//!
//! One [`Invocation`] owns everything a single inference call needs: the
//! resolved binding list, one buffer pair per binding, and the stream its
//! operations are sequenced on. Its lifecycle is strictly linear
//! (allocate, load input, enqueue, synchronize, materialize) and any
//! failure aborts the call, releasing all buffers by drop. An invocation
//! never outlives a single [`Invocation::run`].

use crate::alloc::BufferSet;
use crate::tensor::{Outputs, Tensor};
use basalt_core::{
    resolve_bindings, Binding, DeviceContext, Engine, EngineInfo, Result, RunnerError, Stream,
};
use std::time::Duration;

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct InvocationOptions {
    /// Batch size; every binding's buffers are sized
    /// `volume(shape) * batch_size`. Must be at least 1.
    pub batch_size: usize,
    /// Bound on the synchronization wait before outputs are read.
    /// `None` waits indefinitely.
    pub sync_timeout: Option<Duration>,
}

impl Default for InvocationOptions {
    fn default() -> Self {
        Self {
            batch_size: 1,
            sync_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// One inference call against a compiled engine.
pub struct Invocation<D: DeviceContext> {
    bindings: Vec<Binding>,
    buffers: BufferSet<D>,
    stream: D::Stream,
    options: InvocationOptions,
}

impl<D: DeviceContext> std::fmt::Debug for Invocation<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("bindings", &self.bindings)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<D: DeviceContext> Invocation<D> {
    /// Resolve the engine's bindings and allocate one host/device buffer
    /// pair per binding, plus the stream the run will be sequenced on.
    ///
    /// # Errors
    /// Propagates resolver and allocator failures; see
    /// [`resolve_bindings`] and [`BufferSet::allocate`].
    pub fn prepare(
        device: &D,
        engine: &dyn EngineInfo,
        options: InvocationOptions,
    ) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(RunnerError::InvalidBatchSize(0));
        }
        let bindings = resolve_bindings(engine)?;
        let buffers = BufferSet::allocate(device, &bindings, options.batch_size)?;
        let stream = device.create_stream()?;
        Ok(Self {
            bindings,
            buffers,
            stream,
            options,
        })
    }

    /// The resolved binding list, in engine order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Drive the five-step data path and materialize the named outputs.
    ///
    /// 1. Copy `input` into binding 0's host buffer (local, synchronous).
    /// 2. Enqueue the host-to-device copy of binding 0.
    /// 3. Enqueue the engine execution over the ordered device buffer list.
    /// 4. Enqueue device-to-host readbacks for every output binding.
    /// 5. Synchronize the stream, then reshape each output host buffer to
    ///    its per-sample shape and pair it with its caller-supplied name,
    ///    in binding order.
    ///
    /// The synchronization barrier always runs before any host read; the
    /// readbacks land in the output host buffers when it completes.
    ///
    /// Consumes the invocation: buffers and stream are released on return,
    /// on success and on every error path alike.
    ///
    /// # Errors
    /// - [`RunnerError::ShapeMismatch`] if `input.len()` differs from
    ///   binding 0's element count. Raised before anything is enqueued.
    /// - [`RunnerError::BindingNameMismatch`] if `output_names` does not
    ///   have exactly one name per output binding.
    /// - [`RunnerError::EngineTimeout`] if synchronization exceeds the
    ///   configured bound.
    /// - Backend faults as [`RunnerError::Device`] or
    ///   [`RunnerError::Execution`].
    pub fn run<E: Engine<D>>(
        mut self,
        engine: &E,
        input: &[f32],
        output_names: &[&str],
    ) -> Result<Outputs> {
        let output_count = self.bindings.len() - 1;
        if output_names.len() != output_count {
            return Err(RunnerError::BindingNameMismatch {
                expected: output_count,
                provided: output_names.len(),
            });
        }

        // Step 1: input lands in binding 0's host buffer before any
        // device work is enqueued.
        let expected = self.bindings[0].element_count(self.options.batch_size);
        if input.len() != expected {
            return Err(RunnerError::ShapeMismatch {
                expected,
                actual: input.len(),
            });
        }
        self.buffers
            .pair_mut(0)
            .host
            .as_mut_slice()
            .copy_from_slice(input);

        // Steps 2-4: all ordered on the invocation's stream.
        tracing::debug!(
            bindings = self.bindings.len(),
            batch_size = self.options.batch_size,
            "enqueueing transfer pipeline"
        );
        {
            let input_pair = self.buffers.pair(0);
            self.stream
                .copy_to_device(&input_pair.host, &input_pair.device)?;
        }

        let device_buffers = self.buffers.device_buffers();
        engine.enqueue(self.options.batch_size, &device_buffers, &mut self.stream)?;

        for index in 1..self.buffers.len() {
            self.stream
                .enqueue_readback(&self.buffers.pair(index).device)?;
        }

        // Step 5: barrier before any host read.
        self.stream.synchronize(self.options.sync_timeout)?;

        let readbacks = self.stream.take_readbacks()?;
        if readbacks.len() != output_count {
            return Err(RunnerError::Device(format!(
                "stream completed {} readbacks for {} output bindings",
                readbacks.len(),
                output_count
            )));
        }
        for (offset, data) in readbacks.into_iter().enumerate() {
            let pair = self.buffers.pair_mut(offset + 1);
            if data.len() != pair.element_count() {
                return Err(RunnerError::Device(format!(
                    "readback for binding {} returned {} elements, expected {}",
                    offset + 1,
                    data.len(),
                    pair.element_count()
                )));
            }
            pair.host.as_mut_slice().copy_from_slice(&data);
        }

        let mut entries = Vec::with_capacity(output_count);
        for (binding, name) in self.bindings[1..].iter().zip(output_names) {
            let shape = batched_shape(&binding.shape, self.options.batch_size);
            let data = self.buffers.pair(binding.index).host.as_slice().to_vec();
            entries.push((name.to_string(), Tensor::from_vec(data, &shape)));
        }
        Ok(Outputs::new(entries))
    }
}

/// Prepare and run a single invocation in one call.
///
/// Convenience wrapper over [`Invocation::prepare`] + [`Invocation::run`]
/// for the common one-shot case.
///
/// # Errors
/// See [`Invocation::run`].
pub fn infer<D: DeviceContext, E: Engine<D>>(
    device: &D,
    engine: &E,
    input: &[f32],
    output_names: &[&str],
    options: InvocationOptions,
) -> Result<Outputs> {
    Invocation::prepare(device, engine, options)?.run(engine, input, output_names)
}

fn batched_shape(per_sample: &[usize], batch_size: usize) -> Vec<usize> {
    if batch_size == 1 {
        per_sample.to_vec()
    } else {
        let mut shape = Vec::with_capacity(per_sample.len() + 1);
        shape.push(batch_size);
        shape.extend_from_slice(per_sample);
        shape
    }
}
