use std::ffi::CStr;
use std::time::{Duration, Instant};

use top_core::ffi::TOP_PluginInfo;
use top_core::{CpuPixelSlots, ParamValues, TopInstance};
use top_cpu_memory::{CpuMemSample, BRIGHTNESS, RESET, SPEED};
use top_frames::color::render_synthetic;
use top_frames::{PipelineConfig, PixelBuffer, SyntheticParams};

fn frame_at(step: f64, width: usize, height: usize) -> Vec<f32> {
    let mut expected = PixelBuffer::new(width, height);
    render_synthetic(
        expected.pixels_mut(),
        width,
        height,
        SyntheticParams {
            step,
            brightness: 1.0,
        },
    );
    expected.as_floats().to_vec()
}

fn fast_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_frame_interval(Duration::ZERO)
        .with_acquire_timeout(Duration::from_millis(50))
}

#[test]
fn reset_returns_to_the_first_frame_inline() {
    let mut top = CpuMemSample::with_config(fast_config(), false);
    let mut host = CpuPixelSlots::new(32, 16);
    let moving = ParamValues::new().with(SPEED, 3.0).with(BRIGHTNESS, 1.0);
    for _ in 0..7 {
        top.execute(&mut host.specs(), &moving);
    }
    assert_eq!(top.step(), 21.0);

    top.pulse_pressed(RESET);
    assert_eq!(top.step(), 0.0);

    let still = ParamValues::new().with(SPEED, 0.0).with(BRIGHTNESS, 1.0);
    let mut output = host.specs();
    top.execute(&mut output, &still);
    assert_eq!(output.location_code(), 0);
    assert_eq!(host.slot(0), frame_at(0.0, 32, 16).as_slice());
}

#[test]
fn reset_returns_to_the_first_frame_threaded() {
    let mut top = CpuMemSample::with_config(fast_config(), true);
    assert!(top.is_threaded());
    let mut host = CpuPixelSlots::new(32, 16);
    let moving = ParamValues::new().with(SPEED, 5.0).with(BRIGHTNESS, 1.0);
    for _ in 0..10 {
        top.execute(&mut host.specs(), &moving);
    }
    top.pulse_pressed(RESET);
    assert_eq!(top.step(), 0.0);

    let still = ParamValues::new().with(SPEED, 0.0).with(BRIGHTNESS, 1.0);
    let expected = frame_at(0.0, 32, 16);
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut matched = false;
    while !matched && Instant::now() < deadline {
        let mut output = host.specs();
        top.execute(&mut output, &still);
        if let Some(index) = output.new_cpu_pixel_data_location() {
            matched = host.slot(index) == expected.as_slice();
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(matched, "no frame at step 0 after reset");
    assert_eq!(top.pipeline().map(|p| p.spawn_count()), Some(1));
}

#[test]
fn diagnostics_report_count_and_step() {
    let mut top = CpuMemSample::with_config(fast_config(), false);
    let mut host = CpuPixelSlots::new(4, 4);
    let inputs = ParamValues::new().with(SPEED, 0.5);
    top.execute(&mut host.specs(), &inputs);
    top.execute(&mut host.specs(), &inputs);

    let channels = top.info_channels();
    assert_eq!(channels[0].name, "executeCount");
    assert_eq!(channels[0].value, 2.0);
    assert_eq!(channels[1].value, 1.0);

    let table = top.info_table();
    assert_eq!(table.row(0).unwrap(), ["executeCount", "2"]);
    assert_eq!(table.row(1).unwrap(), ["step", "1"]);
}

#[test]
fn exported_plugin_info() {
    let mut raw: TOP_PluginInfo = unsafe { std::mem::zeroed() };
    unsafe { top_cpu_memory::FillTOPPluginInfo(&mut raw) };
    let op_type = unsafe { CStr::from_ptr(raw.opType.as_ptr()) };
    let icon = unsafe { CStr::from_ptr(raw.opIcon.as_ptr()) };
    assert_eq!(op_type.to_str().unwrap(), "Cpumemsample");
    assert!(CpuMemSample::plugin_info().has_valid_op_type());
    assert_eq!(icon.to_str().unwrap(), "CPM");
    assert_eq!(raw.maxInputs, 1);
}
