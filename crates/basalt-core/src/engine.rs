//! The opaque engine capability interface.
//!
//! A compiled engine is a black box: the runner only introspects its
//! bindings and enqueues executions over device buffers. Splitting
//! introspection from execution lets the binding resolver work without
//! naming a device type.

use crate::device::DeviceContext;
use crate::error::Result;

/// Binding introspection over a compiled engine.
///
/// Bindings are identified by index. By convention binding 0 is the sole
/// input and every other index is an output, in engine-defined order.
/// Shapes are per-sample: they exclude the batch dimension.
pub trait EngineInfo {
    /// Number of bindings (inputs and outputs together) the engine exposes.
    fn binding_count(&self) -> usize;

    /// Per-sample shape of the binding at `index`.
    ///
    /// # Errors
    /// Fails if the engine cannot describe the binding, for example
    /// because `index` is out of range.
    fn binding_shape(&self, index: usize) -> Result<Vec<usize>>;
}

/// A compiled engine executable on device `D`.
///
/// The engine is read-only for the lifetime of a run and may be shared
/// across concurrent invocations; each invocation supplies its own
/// buffers and stream.
pub trait Engine<D: DeviceContext>: EngineInfo {
    /// Enqueue one execution on `stream`.
    ///
    /// `bindings` is the full ordered device buffer list, inputs and
    /// outputs together in binding order. The engine consumes binding 0
    /// and populates the device buffers of all other bindings. Like every
    /// stream operation, the work is ordered but asynchronous; it has not
    /// necessarily completed when this returns.
    ///
    /// # Errors
    /// Fails if the engine rejects the batch size or binding list.
    fn enqueue(
        &self,
        batch_size: usize,
        bindings: &[&D::Buffer],
        stream: &mut D::Stream,
    ) -> Result<()>;
}
