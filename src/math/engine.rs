use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::math::mesh::{ShapeParams, StripMesh, build_strip_mesh};

pub enum MeshCommand {
    Rebuild { generation: u64, params: ShapeParams },
    Stop,
}

pub struct MeshResult {
    pub generation: u64,
    pub params: ShapeParams,
    pub mesh: StripMesh,
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildStats {
    pub last_vertex_count: usize,
    pub last_build_ms: f32,
    pub builds: u64,
}

/// Rebuilds the surface off the render thread. Only the newest request is
/// delivered; results for superseded requests are dropped on receive.
pub struct MeshEngine {
    tx_cmd: Sender<MeshCommand>,
    rx_result: Receiver<MeshResult>,
    stats: Arc<Mutex<BuildStats>>,
    generation: u64,
    requested: Option<ShapeParams>,
    thread_handle: Option<JoinHandle<()>>,
}

impl MeshEngine {
    pub fn new() -> Self {
        let (tx_cmd, rx_cmd) = channel::unbounded::<MeshCommand>();
        let (tx_result, rx_result) = channel::bounded::<MeshResult>(2);
        let stats = Arc::new(Mutex::new(BuildStats::default()));
        let stats_clone = Arc::clone(&stats);

        let thread_handle = thread::Builder::new()
            .name("mesh-engine".into())
            .spawn(move || mesh_thread(rx_cmd, tx_result, stats_clone))
            .map_err(|e| log::error!("failed to spawn mesh thread: {e}"))
            .ok();

        Self {
            tx_cmd,
            rx_result,
            stats,
            generation: 0,
            requested: None,
            thread_handle,
        }
    }

    /// Queues a rebuild unless `params` equals the last request. Returns
    /// whether a rebuild was queued.
    pub fn request(&mut self, params: ShapeParams) -> bool {
        if self.requested == Some(params) {
            return false;
        }

        self.generation += 1;
        self.requested = Some(params);
        log::debug!(
            "mesh rebuild #{} requested (n = {}, r = {}, a = {})",
            self.generation,
            params.grid.n(),
            params.constants.r,
            params.constants.a
        );
        if self
            .tx_cmd
            .send(MeshCommand::Rebuild {
                generation: self.generation,
                params,
            })
            .is_err()
        {
            log::warn!("mesh engine is not running, rebuild #{} dropped", self.generation);
            return false;
        }
        true
    }

    /// Drains finished builds and returns the newest one that matches the
    /// latest request.
    pub fn try_recv_latest(&self) -> Option<MeshResult> {
        let mut latest = None;
        while let Ok(result) = self.rx_result.try_recv() {
            if result.generation == self.generation {
                latest = Some(result);
            }
        }
        latest
    }

    pub fn stats(&self) -> BuildStats {
        *self.stats.lock()
    }

    pub fn stop(&self) {
        let _ = self.tx_cmd.send(MeshCommand::Stop);
    }
}

impl Default for MeshEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MeshEngine {
    fn drop(&mut self) {
        let _ = self.tx_cmd.send(MeshCommand::Stop);
        // unblock a worker parked on a full result channel
        while self.rx_result.try_recv().is_ok() {}
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn mesh_thread(
    rx_cmd: Receiver<MeshCommand>,
    tx_result: Sender<MeshResult>,
    stats: Arc<Mutex<BuildStats>>,
) {
    loop {
        let cmd = match rx_cmd.recv() {
            Ok(c) => c,
            Err(_) => return,
        };

        let (mut generation, mut params) = match cmd {
            MeshCommand::Rebuild { generation, params } => (generation, params),
            MeshCommand::Stop => return,
        };

        // skip straight to the newest queued request
        loop {
            match rx_cmd.try_recv() {
                Ok(MeshCommand::Rebuild {
                    generation: g,
                    params: p,
                }) => {
                    generation = g;
                    params = p;
                }
                Ok(MeshCommand::Stop) => return,
                Err(_) => break,
            }
        }

        let start = Instant::now();
        let mesh = build_strip_mesh(&params);
        let elapsed = start.elapsed();

        {
            let mut s = stats.lock();
            s.last_vertex_count = mesh.vertex_count();
            s.last_build_ms = elapsed.as_secs_f32() * 1000.0;
            s.builds += 1;
        }

        if tx_result
            .send(MeshResult {
                generation,
                params,
                mesh,
                elapsed,
            })
            .is_err()
        {
            return;
        }
    }
}
