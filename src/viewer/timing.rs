//! Wall-clock frame timing for hosts that drive the tick loop themselves.

use std::time::{Duration, Instant};

/// Tracks per-frame delta time and a once-per-second frame-rate log.
pub struct FrameTiming {
    last_frame: Instant,
    fps_window_start: Instant,
    frames_in_window: u32,
}

impl Default for FrameTiming {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            fps_window_start: now,
            frames_in_window: 0,
        }
    }
}

impl FrameTiming {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next frame and return the elapsed delta in seconds.
    pub fn next_frame(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frames_in_window += 1;
        let window = now.duration_since(self.fps_window_start);
        if window >= Duration::from_secs(1) {
            let fps = self.frames_in_window as f32 / window.as_secs_f32();
            log::debug!("render loop at {:.1} fps", fps);
            self.fps_window_start = now;
            self.frames_in_window = 0;
        }
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_nonnegative_and_advances() {
        let mut timing = FrameTiming::new();
        std::thread::sleep(Duration::from_millis(5));
        let dt = timing.next_frame();
        assert!(dt >= 0.004);
        let dt2 = timing.next_frame();
        assert!(dt2 >= 0.0);
        assert!(dt2 < dt);
    }
}
