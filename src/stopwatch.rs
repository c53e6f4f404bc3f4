use std::time::{Duration, Instant};
#[derive(Debug, Clone)]
pub struct Stopwatch {
    running: Option<Instant>,
    total: Duration,
}
impl Stopwatch {
    pub fn new() -> Self {
        Self {
            running: None,
            total: Duration::new(0, 0),
        }
    }
    pub fn start(&mut self) {
        assert!(self.running.is_none());
        self.running = Some(Instant::now());
    }
    pub fn stop(&mut self) {
        if let Some(started) = self.running.take() {
            self.total += started.elapsed();
        }
    }
    pub fn total_ms(&self) -> u128 {
        return self.total.as_millis();
    }
    pub fn total_secs(&self) -> u64 {
        return self.total.as_secs();
    }
}
impl Default for Stopwatch {
    fn default() -> Self {
        Stopwatch::new()
    }
}
