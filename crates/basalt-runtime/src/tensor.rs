//! Materialized tensors: host buffers reinterpreted with shape and name.

use basalt_core::{volume, Result, RunnerError};

/// A host tensor with a semantic shape.
///
/// Data is row-major f32, matching the layout the engine wrote into the
/// binding's host buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl Tensor {
    /// Create a tensor from a vector with a given shape.
    ///
    /// # Panics
    /// Panics if `data.len()` does not equal the shape's volume.
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Self {
        let expected = volume(shape);
        assert_eq!(
            data.len(),
            expected,
            "data length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected
        );
        Self {
            data,
            shape: shape.to_vec(),
        }
    }

    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat row-major view of the data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extract channel `c` of an `(height, width, channels)` tensor as a
    /// flat `height * width` vector.
    ///
    /// # Errors
    /// Fails if the tensor is not 3-D or `c` is out of range.
    pub fn channel(&self, c: usize) -> Result<Vec<f32>> {
        let [h, w, channels] = *self.shape.as_slice() else {
            return Err(RunnerError::Export(format!(
                "expected a (height, width, channels) tensor, got shape {:?}",
                self.shape
            )));
        };
        if c >= channels {
            return Err(RunnerError::Export(format!(
                "channel {c} out of range for {channels} channels"
            )));
        }
        let mut out = Vec::with_capacity(h * w);
        for pixel in 0..h * w {
            out.push(self.data[pixel * channels + c]);
        }
        Ok(out)
    }
}

/// The materialized outputs of one invocation: name-to-tensor, one entry
/// per output binding, preserved in binding order.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    entries: Vec<(String, Tensor)>,
}

impl Outputs {
    pub(crate) fn new(entries: Vec<(String, Tensor)>) -> Self {
        Self { entries }
    }

    /// Number of output tensors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the invocation produced no outputs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a tensor by its semantic name.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Iterate `(name, tensor)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }
}

impl<'a> IntoIterator for &'a Outputs {
    type Item = (&'a String, &'a Tensor);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, Tensor)>,
        fn(&'a (String, Tensor)) -> (&'a String, &'a Tensor),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(|(n, t)| (n, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_records_shape() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.len(), 6);
    }

    #[test]
    #[should_panic(expected = "doesn't match shape")]
    fn from_vec_rejects_wrong_length() {
        Tensor::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]);
    }

    #[test]
    fn channel_extraction_is_strided() {
        // 2x2x2 hwc tensor: channel 0 holds 0,2,4,6 and channel 1 holds 1,3,5,7.
        let t = Tensor::from_vec((0..8).map(|v| v as f32).collect(), &[2, 2, 2]);
        assert_eq!(t.channel(0).unwrap(), vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(t.channel(1).unwrap(), vec![1.0, 3.0, 5.0, 7.0]);
        assert!(t.channel(2).is_err());
    }

    #[test]
    fn channel_requires_three_dims() {
        let t = Tensor::from_vec(vec![0.0; 4], &[2, 2]);
        assert!(t.channel(0).is_err());
    }

    #[test]
    fn outputs_preserve_binding_order() {
        let outputs = Outputs::new(vec![
            ("conf".to_string(), Tensor::from_vec(vec![1.0], &[1])),
            ("paf".to_string(), Tensor::from_vec(vec![2.0], &[1])),
        ]);
        let names: Vec<&str> = outputs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["conf", "paf"]);
        assert_eq!(outputs.get("paf").unwrap().as_slice(), &[2.0]);
        assert!(outputs.get("missing").is_none());
    }
}
