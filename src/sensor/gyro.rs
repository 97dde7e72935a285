use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use glam::DVec3;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const STREAM_CAPACITY: usize = 256;

/// One 3-axis delta from the rotation sensor (or a keyboard stand-in).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GyroReading {
    pub delta: DVec3,
}

impl GyroReading {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            delta: DVec3::new(x, y, z),
        }
    }
}

/// Multi-producer reading queue drained once per frame.
pub struct GyroStream {
    tx: Sender<GyroReading>,
    rx: Receiver<GyroReading>,
}

impl GyroStream {
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(STREAM_CAPACITY);
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<GyroReading> {
        self.tx.clone()
    }

    /// Pushes a reading, dropping it when the queue is full.
    pub fn push(&self, reading: GyroReading) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(reading) {
            log::trace!("gyro stream full, dropping reading");
        }
    }

    pub fn drain(&self) -> Vec<GyroReading> {
        self.rx.try_iter().collect()
    }
}

impl Default for GyroStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Background thread emitting readings along a Lissajous path, for machines
/// without a rotation sensor.
pub struct SimulatedGyro {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SimulatedGyro {
    pub fn spawn(tx: Sender<GyroReading>, rate_hz: f64, amplitude: f64) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let period = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));

        let thread_handle = thread::Builder::new()
            .name("simulated-gyro".into())
            .spawn(move || gyro_thread(tx, period, amplitude, running_clone))
            .map_err(|e| log::error!("failed to spawn gyro thread: {e}"))
            .ok();

        log::info!("simulated gyroscope running at {:.0} Hz", 1.0 / period.as_secs_f64());

        Self {
            running,
            thread_handle,
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Drop for SimulatedGyro {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn lissajous(t: f64, amplitude: f64) -> DVec3 {
    DVec3::new(
        amplitude * (0.7 * t).sin(),
        amplitude * (1.1 * t).sin(),
        0.4 * amplitude * (0.5 * t).sin(),
    )
}

fn gyro_thread(
    tx: Sender<GyroReading>,
    period: Duration,
    amplitude: f64,
    running: Arc<AtomicBool>,
) {
    let start = Instant::now();
    let mut previous = lissajous(0.0, amplitude);

    while running.load(Ordering::Relaxed) {
        thread::sleep(period);

        let current = lissajous(start.elapsed().as_secs_f64(), amplitude);
        let delta = current - previous;
        previous = current;

        match tx.try_send(GyroReading { delta }) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}
