#![cfg(not(feature = "arena"))]

use std::time::{Duration, Instant};

use top_core::{CpuPixelSlots, ParamValues, TopInstance};
use top_depth_acquisition::simulated::SimulatedSystem;
use top_depth_acquisition::{Camera, DepthAcquire, FAR, NEAR, OUTPUT_HEIGHT, OUTPUT_WIDTH, RESET};
use top_frames::{HardwareSource, PipelineConfig, WorkerStatus};

fn config() -> PipelineConfig {
    PipelineConfig::default().with_acquire_timeout(Duration::from_millis(200))
}

fn simulated(width: usize, height: usize) -> DepthAcquire<SimulatedSystem> {
    let source = HardwareSource::open(SimulatedSystem::with_devices(1, width, height));
    DepthAcquire::with_source(source, config())
}

/// Tick until a frame is uploaded; returns the host slot it landed in.
fn first_upload(
    top: &mut DepthAcquire<SimulatedSystem>,
    host: &mut CpuPixelSlots,
    inputs: &ParamValues,
) -> Option<usize> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        let mut output = host.specs();
        top.execute(&mut output, inputs);
        if let Some(index) = output.new_cpu_pixel_data_location() {
            return Some(index);
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    None
}

#[test]
fn simulated_camera_frames_are_colored() {
    let mut top = simulated(64, 48);
    let mut host = CpuPixelSlots::new(64, 48);
    let inputs = ParamValues::new().with(NEAR, 0.0).with(FAR, 6000.0);
    let index = first_upload(&mut top, &mut host, &inputs).expect("no frame uploaded");

    for y in 0..48 {
        for x in 0..64 {
            let [r, g, b, a] = host.pixel(index, x, y);
            assert_eq!(a, 1.0);
            // Every ramp color has green or blue saturated, or is pure red.
            assert!(g == 1.0 || b == 1.0 || (r == 1.0 && b == 0.0), "({x}, {y}) = {r} {g} {b}");
        }
    }
    assert_eq!(top.pipeline().spawn_count(), 1);
}

#[test]
fn empty_window_renders_black() {
    let mut top = simulated(16, 8);
    let mut host = CpuPixelSlots::new(16, 8);
    let inputs = ParamValues::new().with(NEAR, 3000.0).with(FAR, 3000.0);
    let index = first_upload(&mut top, &mut host, &inputs).expect("no frame uploaded");
    assert!(host
        .slot(index)
        .chunks_exact(4)
        .all(|pixel| pixel == [0.0, 0.0, 0.0, 1.0]));
}

#[test]
fn mismatched_output_gets_no_frames() {
    let mut top = simulated(64, 48);
    let mut host = CpuPixelSlots::new(32, 32);
    let inputs = ParamValues::new().with(FAR, 6000.0);
    for _ in 0..50 {
        let mut output = host.specs();
        top.execute(&mut output, &inputs);
        assert_eq!(output.location_code(), -1);
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(top.pipeline().stats().produced, 0);
}

#[test]
fn missing_camera_keeps_the_last_frame() {
    let mut top = DepthAcquire::<SimulatedSystem>::with_source(
        HardwareSource::open(SimulatedSystem::with_devices(0, 64, 48)),
        config(),
    );
    let mut host = CpuPixelSlots::new(64, 48);
    let inputs = ParamValues::new();
    for _ in 0..20 {
        let mut output = host.specs();
        top.execute(&mut output, &inputs);
        assert_eq!(output.location_code(), -1);
    }
    assert_eq!(top.diagnostics().execute_count, 20);
}

#[test]
fn drop_interrupts_a_long_acquire() {
    let source = HardwareSource::open(SimulatedSystem::with_devices(1, 8, 8));
    let mut top = DepthAcquire::with_source(
        source,
        PipelineConfig::default().with_acquire_timeout(Duration::from_secs(60)),
    );
    let mut host = CpuPixelSlots::new(8, 8);
    top.execute(&mut host.specs(), &ParamValues::new());
    std::thread::sleep(Duration::from_millis(50));
    assert_ne!(top.pipeline().worker_status(), WorkerStatus::NotStarted);

    let started = Instant::now();
    drop(top);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn requests_sensor_resolution_and_ignores_reset() {
    let mut top = DepthAcquire::<Camera>::with_source(HardwareSource::unavailable(), config());
    assert_eq!(top.output_format(), Some((OUTPUT_WIDTH, OUTPUT_HEIGHT)));
    top.pulse_pressed(RESET);
    assert_eq!(top.diagnostics().step, 0.0);
    let info = DepthAcquire::<Camera>::plugin_info();
    assert_eq!(info.op_type, "Depthacquire");
    assert!(info.has_valid_op_type());
}
