use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use top_core::CpuPixelSlots;
use top_frames::{
    CameraDevice, CameraSystem, DepthMapper, DepthParams, FrameInstance, FrameSource, HardwareSource,
    PipelineConfig, RawFrame, SourceError,
};

type Journal = Arc<Mutex<Vec<String>>>;

struct Image {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl RawFrame for Image {
    fn data(&self) -> &[u8] {
        &self.data
    }
    fn bits_per_pixel(&self) -> usize {
        64
    }
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
}

struct MockDevice {
    journal: Journal,
    depth: i16,
    width: usize,
    height: usize,
}

impl CameraDevice for MockDevice {
    type Image = Image;

    fn start_stream(&mut self) -> Result<(), SourceError> {
        self.journal.lock().push("start_stream".into());
        Ok(())
    }

    fn stop_stream(&mut self) -> Result<(), SourceError> {
        self.journal.lock().push("stop_stream".into());
        Ok(())
    }

    fn get_image(&mut self, _timeout: Duration) -> Result<Image, SourceError> {
        let mut data = vec![0u8; self.width * self.height * 8];
        for pixel in data.chunks_exact_mut(8) {
            pixel[4..6].copy_from_slice(&self.depth.to_le_bytes());
        }
        std::thread::sleep(Duration::from_millis(1));
        Ok(Image {
            data,
            width: self.width,
            height: self.height,
        })
    }

    fn requeue_buffer(&mut self, _image: Image) -> Result<(), SourceError> {
        Ok(())
    }

    fn coordinate_scale(&mut self) -> Result<f64, SourceError> {
        Ok(0.25)
    }
}

struct MockSystem {
    journal: Journal,
    device_count: usize,
    width: usize,
    height: usize,
}

impl MockSystem {
    fn new(device_count: usize) -> (Self, Journal) {
        let journal = Journal::default();
        (
            Self {
                journal: Arc::clone(&journal),
                device_count,
                width: 4,
                height: 3,
            },
            journal,
        )
    }
}

impl CameraSystem for MockSystem {
    type Device = MockDevice;
    type DeviceInfo = usize;

    fn update_devices(&mut self, _timeout: Duration) -> Result<(), SourceError> {
        Ok(())
    }

    fn devices(&mut self) -> Result<Vec<usize>, SourceError> {
        Ok((0..self.device_count).collect())
    }

    fn create_device(&mut self, info: &usize) -> Result<MockDevice, SourceError> {
        self.journal.lock().push(format!("create_device {info}"));
        Ok(MockDevice {
            journal: Arc::clone(&self.journal),
            depth: 8000,
            width: self.width,
            height: self.height,
        })
    }

    fn destroy_device(&mut self, _device: MockDevice) -> Result<(), SourceError> {
        self.journal.lock().push("destroy_device".into());
        Ok(())
    }
}

impl Drop for MockSystem {
    fn drop(&mut self) {
        self.journal.lock().push("close_system".into());
    }
}

#[test]
fn teardown_runs_in_reverse_order() {
    let (system, journal) = MockSystem::new(2);
    let source = HardwareSource::open(system);
    assert!(source.is_available());
    assert_eq!(source.coordinate_scale(), Some(0.25));
    source.close();
    assert_eq!(
        *journal.lock(),
        vec!["create_device 0", "start_stream", "stop_stream", "destroy_device", "close_system"]
    );
}

#[test]
fn no_device_means_unavailable() {
    let (system, journal) = MockSystem::new(0);
    let mut source = HardwareSource::open(system);
    assert!(!source.is_available());
    assert_eq!(source.acquire(Duration::from_millis(1)).err(), Some(SourceError::DeviceUnavailable));
    drop(source);
    assert_eq!(*journal.lock(), vec!["close_system"]);
}

#[test]
fn unavailable_instance_never_uploads() {
    let mut instance = FrameInstance::new(
        "no-camera",
        HardwareSource::<MockSystem>::unavailable(),
        DepthMapper::new(1.0),
        DepthParams::default(),
        PipelineConfig::default().with_acquire_timeout(Duration::from_millis(10)),
    );
    let mut host = CpuPixelSlots::new(4, 3);
    for _ in 0..20 {
        assert!(!instance.tick(&mut host.specs(), DepthParams::default()));
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(instance.shutdown().is_some());
}

#[test]
fn camera_frames_reach_the_host() {
    let (system, journal) = MockSystem::new(1);
    let source = HardwareSource::open(system);
    let mapper = DepthMapper::new(source.coordinate_scale().unwrap_or(1.0));
    let mut instance = FrameInstance::new(
        "camera",
        source,
        mapper,
        DepthParams::default(),
        PipelineConfig::default().with_acquire_timeout(Duration::from_millis(50)),
    );
    let window = DepthParams {
        near: 0.0,
        far: 4000.0,
    };
    let mut host = CpuPixelSlots::new(4, 3);
    let mut seen = None;
    for _ in 0..5000 {
        let mut output = host.specs();
        instance.tick(&mut output, window);
        if let Some(index) = output.new_cpu_pixel_data_location() {
            seen = Some(host.pixel(index, 0, 0));
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    // 8000 * 0.25 = 2000 mm, the middle of the window.
    assert_eq!(seen, Some([0.0, 1.0, 0.0, 1.0]));

    drop(instance);
    assert_eq!(journal.lock().last().map(String::as_str), Some("close_system"));
}
