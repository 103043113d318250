//! Binding descriptors and the binding resolver.

use crate::engine::EngineInfo;
use crate::error::{Result, RunnerError};

/// Whether a binding is the engine's input or one of its outputs.
///
/// The role is derived from the index convention (0 is the input, every
/// other index an output) exactly once, when the binding list is built,
/// so the convention never has to be recomputed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingRole {
    /// Binding 0: the tensor the caller supplies.
    Input,
    /// Any non-zero index: a tensor the engine produces.
    Output,
}

/// One input or output slot of a compiled engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Position in the engine's binding list. Ordering is load-bearing:
    /// device buffers are handed to the engine in this order.
    pub index: usize,
    /// Per-sample shape, excluding the batch dimension.
    pub shape: Vec<usize>,
    /// Role derived from `index` at construction time.
    pub role: BindingRole,
}

impl Binding {
    /// Product of the per-sample shape's dimensions.
    pub fn volume(&self) -> usize {
        volume(&self.shape)
    }

    /// Total element count for this binding at the given batch size.
    pub fn element_count(&self, batch_size: usize) -> usize {
        self.volume() * batch_size
    }

    /// True for binding 0.
    pub fn is_input(&self) -> bool {
        self.role == BindingRole::Input
    }
}

/// Product of a shape's dimension sizes.
pub fn volume(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Enumerate an engine's bindings with their per-sample shapes.
///
/// Side-effect-free: only reads the engine's introspection surface.
///
/// # Errors
/// Returns [`RunnerError::EngineIntrospection`] if the engine reports
/// zero bindings, or an empty or zero-dimension shape for any binding.
/// Such an engine cannot be driven safely.
pub fn resolve_bindings(engine: &dyn EngineInfo) -> Result<Vec<Binding>> {
    let count = engine.binding_count();
    if count == 0 {
        return Err(RunnerError::EngineIntrospection(
            "engine reports zero bindings".to_string(),
        ));
    }

    let mut bindings = Vec::with_capacity(count);
    for index in 0..count {
        let shape = engine.binding_shape(index)?;
        if shape.is_empty() {
            return Err(RunnerError::EngineIntrospection(format!(
                "binding {index} reports an empty shape"
            )));
        }
        if shape.contains(&0) {
            return Err(RunnerError::EngineIntrospection(format!(
                "binding {index} reports a zero dimension in shape {shape:?}"
            )));
        }
        let role = if index == 0 {
            BindingRole::Input
        } else {
            BindingRole::Output
        };
        tracing::debug!(index, ?shape, ?role, "resolved binding");
        bindings.push(Binding { index, shape, role });
    }

    Ok(bindings)
}
