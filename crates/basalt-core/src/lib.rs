//! Capability traits and binding metadata for compiled-engine execution.
//!
//! A compiled engine is an opaque computational graph with fixed-shape
//! input and output slots ("bindings"). This crate defines the seams the
//! runner in `basalt-runtime` is written against:
//!
//! 1. **Engine introspection** - [`EngineInfo`] and the binding resolver
//!    turn an opaque handle into an ordered `Vec<Binding>`.
//! 2. **Device capability** - [`DeviceContext`], [`DeviceBuffer`], and
//!    [`Stream`] abstract the accelerator: buffer allocation plus an
//!    in-order asynchronous operation queue.
//! 3. **Execution** - [`Engine`] enqueues one run over the full ordered
//!    device buffer list.
//!
//! Everything here is backend-neutral; no accelerator API appears in
//! this crate. Backends live in `basalt-runtime`.

mod binding;
mod device;
mod engine;
mod error;

pub use binding::{resolve_bindings, volume, Binding, BindingRole};
pub use device::{DeviceBuffer, DeviceContext, HostBuffer, Stream};
pub use engine::{Engine, EngineInfo};
pub use error::{Result, RunnerError};
