//! # Clock — Frame Counter and Timestamps
//!
//! Each [`World`](crate::ecs::World) owns one [`Clock`]. An outer driver (a
//! window's redraw callback, a test) hands it strictly increasing
//! timestamps through [`World::advance_to`](crate::ecs::World::advance_to),
//! which steps the clock and then runs one tick:
//!
//! ```text
//! advance_to(16.0)   frame 1   delta  0.0 ms   (first frame)
//! advance_to(32.7)   frame 2   delta 16.7 ms   fps ≈ 59.9
//! advance_to(30.0)   ignored: not after 32.7
//! ```
//!
//! Systems read it with `world.clock()` during their tick.

/// Frame timing for one world.
#[derive(Clone, Debug, Default)]
pub struct Clock {
    frame: u64,
    timestamp_ms: f64,
    delta_ms: f64,
    start_ms: Option<f64>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to `timestamp_ms`.
    ///
    /// Returns `false` and changes nothing unless the timestamp is strictly
    /// after the current one. The first accepted timestamp has a zero delta.
    pub fn advance(&mut self, timestamp_ms: f64) -> bool {
        if !timestamp_ms.is_finite() {
            return false;
        }
        match self.start_ms {
            None => {
                self.start_ms = Some(timestamp_ms);
                self.delta_ms = 0.0;
            }
            Some(_) if timestamp_ms <= self.timestamp_ms => return false,
            Some(_) => self.delta_ms = timestamp_ms - self.timestamp_ms,
        }
        self.timestamp_ms = timestamp_ms;
        self.frame += 1;
        true
    }

    /// Number of accepted timestamps so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The current timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    /// Milliseconds since the previous frame.
    pub fn delta_ms(&self) -> f64 {
        self.delta_ms
    }

    /// Delta time in seconds.
    pub fn delta_secs(&self) -> f32 {
        (self.delta_ms / 1000.0) as f32
    }

    /// Milliseconds since the first frame.
    pub fn elapsed_ms(&self) -> f64 {
        self.start_ms.map_or(0.0, |start| self.timestamp_ms - start)
    }

    /// Instantaneous frames per second from the last delta (0 on the first frame).
    pub fn fps(&self) -> f64 {
        if self.delta_ms > 0.0 {
            1000.0 / self.delta_ms
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let clock = Clock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.delta_ms(), 0.0);
        assert_eq!(clock.fps(), 0.0);
    }

    #[test]
    fn first_frame_has_zero_delta() {
        let mut clock = Clock::new();
        assert!(clock.advance(100.0));
        assert_eq!(clock.frame(), 1);
        assert_eq!(clock.delta_ms(), 0.0);
        assert_eq!(clock.elapsed_ms(), 0.0);
    }

    #[test]
    fn advance_tracks_delta_and_fps() {
        let mut clock = Clock::new();
        clock.advance(0.0);
        clock.advance(20.0);
        assert_eq!(clock.frame(), 2);
        assert_eq!(clock.delta_ms(), 20.0);
        assert!((clock.fps() - 50.0).abs() < 1e-9);
        assert!((clock.delta_secs() - 0.02).abs() < 1e-6);
        clock.advance(50.0);
        assert_eq!(clock.elapsed_ms(), 50.0);
    }

    #[test]
    fn non_increasing_timestamps_are_ignored() {
        let mut clock = Clock::new();
        clock.advance(10.0);
        assert!(!clock.advance(10.0));
        assert!(!clock.advance(5.0));
        assert_eq!(clock.frame(), 1);
        assert_eq!(clock.timestamp_ms(), 10.0);
    }
}
