//! Diagnostics and export stage tests.

mod common;

use basalt_runtime::{
    infer, log_stats, persist_outputs, save_channel_images, HostDevice, InvocationOptions, Result,
    Tensor, TensorSink, TensorStats,
};
use common::FixedEngine;
use std::path::{Path, PathBuf};

/// Sink that records every handoff instead of writing bytes.
#[derive(Default)]
struct RecordingSink {
    calls: Vec<(PathBuf, Vec<usize>)>,
}

impl TensorSink for RecordingSink {
    fn persist(&mut self, path: &Path, tensor: &Tensor) -> Result<()> {
        self.calls.push((path.to_path_buf(), tensor.shape().to_vec()));
        Ok(())
    }
}

#[test]
fn stats_report_all_four_moments() {
    let t = Tensor::from_vec(vec![-1.0, 0.0, 1.0, 2.0], &[2, 2]);
    let stats = log_stats("example", &t);
    assert_eq!(stats.min, -1.0);
    assert_eq!(stats.max, 2.0);
    assert_eq!(stats.mean, 0.5);
    assert!((stats.std - 1.25f32.sqrt()).abs() < 1e-6);
}

#[test]
fn channel_images_are_written_per_channel() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("paf");

    // 4x3 image with 2 channels; channel 1 is constant.
    let mut data = Vec::new();
    for j in 0..12 {
        data.push(j as f32);
        data.push(3.5);
    }
    let tensor = Tensor::from_vec(data, &[4, 3, 2]);

    let paths = save_channel_images(prefix.to_str().unwrap(), &tensor).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("paf-0.png"));
    assert!(paths[1].ends_with("paf-1.png"));

    for (c, path) in paths.iter().enumerate() {
        let img = image::open(path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (3, 4));
        if c == 1 {
            // A constant channel is left at its mean-subtracted zero, so
            // every pixel rasterizes to 0 rather than dividing by zero.
            assert!(img.pixels().all(|p| p.0[0] == 0));
        }
    }
}

#[test]
fn varying_channel_spans_the_display_range() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("conf");

    let tensor = Tensor::from_vec(vec![0.0, 1.0, 2.0, 3.0], &[2, 2, 1]);
    let paths = save_channel_images(prefix.to_str().unwrap(), &tensor).unwrap();

    let img = image::open(&paths[0]).unwrap().to_luma8();
    let pixels: Vec<u8> = img.pixels().map(|p| p.0[0]).collect();
    // Mean-subtracted values run -1.5..1.5 over a range of 3, so the
    // positive half maps onto 0..127 and the negative half clamps to 0.
    assert_eq!(pixels[0], 0);
    assert_eq!(pixels[1], 0);
    assert!(pixels[3] > pixels[2]);
    assert_eq!(pixels[3], 127);
}

#[test]
fn every_output_is_handed_to_the_sink_once() {
    let device = HostDevice::new();
    let engine = FixedEngine::new(vec![vec![2, 2], vec![3], vec![4]]);
    let outputs = infer(
        &device,
        &engine,
        &[0.1, 0.2, 0.3, 0.4],
        &["conf", "paf"],
        InvocationOptions::default(),
    )
    .unwrap();

    let mut sink = RecordingSink::default();
    persist_outputs(&mut sink, &outputs, |name| {
        PathBuf::from(format!("/tmp/{name}.idx"))
    })
    .unwrap();

    assert_eq!(
        sink.calls,
        vec![
            (PathBuf::from("/tmp/conf.idx"), vec![3]),
            (PathBuf::from("/tmp/paf.idx"), vec![4]),
        ]
    );
}

#[test]
fn stats_match_between_runs_of_the_same_input() {
    let engine = FixedEngine::new(vec![vec![4], vec![6]]);
    let input = [0.25, 0.5, 0.75, 1.0];

    let a = infer(
        &HostDevice::new(),
        &engine,
        &input,
        &["out"],
        InvocationOptions::default(),
    )
    .unwrap();
    let b = infer(
        &HostDevice::new(),
        &engine,
        &input,
        &["out"],
        InvocationOptions::default(),
    )
    .unwrap();

    assert_eq!(
        TensorStats::compute(a.get("out").unwrap()),
        TensorStats::compute(b.get("out").unwrap())
    );
}
