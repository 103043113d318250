//! Shared fakes for runner integration tests.
//!
//! `FixedEngine` implements the engine capability traits over the CPU
//! reference device: fixed binding shapes, outputs computed as a pure
//! function of the input, so results are deterministic across
//! independently allocated invocations.

use basalt_runtime::{Engine, EngineInfo, HostDevice, HostDeviceBuffer, HostStream};
use basalt_runtime::{DeviceBuffer, Result, RunnerError};

/// Fake engine with a fixed binding list.
pub struct FixedEngine {
    shapes: Vec<Vec<usize>>,
}

impl FixedEngine {
    pub fn new(shapes: Vec<Vec<usize>>) -> Self {
        Self { shapes }
    }

    /// Binding layout of the pose-estimation engine the runner was built
    /// around: one image input, confidence-map and part-affinity-field
    /// outputs.
    pub fn pose_like() -> Self {
        Self::new(vec![vec![3, 368, 432], vec![46, 54, 19], vec![46, 54, 38]])
    }
}

impl EngineInfo for FixedEngine {
    fn binding_count(&self) -> usize {
        self.shapes.len()
    }

    fn binding_shape(&self, index: usize) -> Result<Vec<usize>> {
        self.shapes
            .get(index)
            .cloned()
            .ok_or_else(|| RunnerError::EngineIntrospection(format!("no binding {index}")))
    }
}

impl Engine<HostDevice> for FixedEngine {
    fn enqueue(
        &self,
        _batch_size: usize,
        bindings: &[&HostDeviceBuffer],
        _stream: &mut HostStream,
    ) -> Result<()> {
        let input = bindings[0].read();
        let mean = input.iter().sum::<f32>() / input.len() as f32;
        for (index, output) in bindings.iter().enumerate().skip(1) {
            let values: Vec<f32> = (0..output.element_count())
                .map(|j| mean + (index * 31 + j % 97) as f32 * 0.125)
                .collect();
            output.write(&values)?;
        }
        Ok(())
    }
}

/// A realistic 368x432 RGB input, flattened.
pub fn pose_input() -> Vec<f32> {
    (0..3 * 368 * 432).map(|j| (j % 255) as f32 / 255.0).collect()
}
