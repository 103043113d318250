//! Binding-based runner for compiled engines.
//!
//! Drives a previously compiled, opaque engine against a fixed-shape
//! tensor input and recovers its named output tensors. The runner owns
//! four responsibilities:
//!
//! 1. **Buffer allocation** - one matched host/device pair per binding,
//!    sized from the binding's per-sample shape and the batch size.
//! 2. **Stream-ordered transfers** - host-to-device upload of the input,
//!    one engine execution, device-to-host readbacks of every output,
//!    all sequenced on a single ordered stream and synchronized before
//!    any host read.
//! 3. **Materialization** - each output host buffer reshaped to its
//!    semantic shape and paired with a caller-supplied name.
//! 4. **Diagnostics and export** - summary statistics, per-channel image
//!    rasterization, and the persistence handoff.
//!
//! Engine construction and compilation live elsewhere; the engine is a
//! black box behind the `basalt-core` capability traits. The crate ships
//! two device backends: [`HostDevice`], a CPU reference used in tests
//! and accelerator-free environments, and [`WgpuContext`] for real GPUs.
//!
//! # Example
//!
//! ```
//! use basalt_core::{Engine, EngineInfo, Result};
//! use basalt_runtime::{infer, HostDevice, HostDeviceBuffer, HostStream, InvocationOptions};
//!
//! /// A stand-in engine that doubles its input.
//! struct DoubleEngine;
//!
//! impl EngineInfo for DoubleEngine {
//!     fn binding_count(&self) -> usize {
//!         2
//!     }
//!     fn binding_shape(&self, _index: usize) -> Result<Vec<usize>> {
//!         Ok(vec![2, 2])
//!     }
//! }
//!
//! impl Engine<HostDevice> for DoubleEngine {
//!     fn enqueue(
//!         &self,
//!         _batch_size: usize,
//!         bindings: &[&HostDeviceBuffer],
//!         _stream: &mut HostStream,
//!     ) -> Result<()> {
//!         let doubled: Vec<f32> = bindings[0].read().iter().map(|v| v * 2.0).collect();
//!         bindings[1].write(&doubled)
//!     }
//! }
//!
//! let device = HostDevice::new();
//! let outputs = infer(
//!     &device,
//!     &DoubleEngine,
//!     &[1.0, 2.0, 3.0, 4.0],
//!     &["doubled"],
//!     InvocationOptions::default(),
//! )?;
//! assert_eq!(outputs.get("doubled").unwrap().as_slice(), &[2.0, 4.0, 6.0, 8.0]);
//! # Ok::<(), basalt_core::RunnerError>(())
//! ```

mod alloc;
mod export;
mod gpu;
mod host;
mod invocation;
mod stats;
mod tensor;

pub use alloc::{BufferPair, BufferSet};
pub use export::{normalize_channel, persist_outputs, save_channel_images, TensorSink};
pub use gpu::{WgpuBuffer, WgpuContext, WgpuStream};
pub use host::{HostDevice, HostDeviceBuffer, HostStream};
pub use invocation::{infer, Invocation, InvocationOptions};
pub use stats::{log_stats, TensorStats};
pub use tensor::{Outputs, Tensor};

// Re-export the capability seams so most users only need this crate.
pub use basalt_core::{
    resolve_bindings, volume, Binding, BindingRole, DeviceBuffer, DeviceContext, Engine,
    EngineInfo, HostBuffer, Result, RunnerError, Stream,
};
