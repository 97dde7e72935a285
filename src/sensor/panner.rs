use glam::DVec3;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receiver for the spatial audio source position.
pub trait PannerSink {
    fn set_position(&mut self, position: DVec3);
}

/// Position-update end of the audio graph. Holds the most recent position
/// for whoever drives the actual panner node.
#[derive(Clone, Default)]
pub struct AudioPanner {
    position: Arc<Mutex<Option<DVec3>>>,
    updates: Arc<AtomicU64>,
}

impl AudioPanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<DVec3> {
        *self.position.lock()
    }

    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

impl PannerSink for AudioPanner {
    fn set_position(&mut self, position: DVec3) {
        let mut current = self.position.lock();
        if *current == Some(position) {
            return;
        }
        log::debug!(
            "panner -> ({:.2}, {:.2}, {:.2})",
            position.x,
            position.y,
            position.z
        );
        *current = Some(position);
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_position_is_not_an_update() {
        let mut panner = AudioPanner::new();
        assert_eq!(panner.position(), None);

        panner.set_position(DVec3::new(30.0, 40.0, 1.0));
        panner.set_position(DVec3::new(30.0, 40.0, 1.0));
        assert_eq!(panner.updates(), 1);

        let shared = panner.clone();
        panner.set_position(DVec3::new(31.0, 40.0, 1.0));
        assert_eq!(shared.position(), Some(DVec3::new(31.0, 40.0, 1.0)));
        assert_eq!(shared.updates(), 2);
    }
}
