//! Placeholder background simulation worker
//!
//! Stands in for an asynchronous computation running beside the renderer:
//! a periodic task advancing a mutex-protected phase scalar, with a dummy
//! workload between updates. The render graph never reads it on its
//! critical path; the overlay logs it. Shutdown is cooperative: flip the
//! running flag, then join.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Phase advance in radians per second
const SIM_SPEED: f32 = 0.5;

/// Pause between simulation steps
const STEP_INTERVAL: Duration = Duration::from_millis(10);

const TWO_PI: f32 = std::f32::consts::TAU;

/// Handle to the background simulation thread
pub struct SimulationWorker {
    running: Arc<AtomicBool>,
    phase: Arc<Mutex<f32>>,
    handle: Option<JoinHandle<()>>,
}

impl SimulationWorker {
    /// Start the worker thread
    pub fn spawn() -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let phase = Arc::new(Mutex::new(0.0f32));

        let thread_running = Arc::clone(&running);
        let thread_phase = Arc::clone(&phase);
        let handle = std::thread::spawn(move || run(&thread_running, &thread_phase));

        log::info!("Simulation worker started");

        Self {
            running,
            phase,
            handle: Some(handle),
        }
    }

    /// Current phase value in [0, 2*pi)
    pub fn phase(&self) -> f32 {
        *self.phase.lock().unwrap()
    }

    /// Stop the worker and wait for it to exit
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Simulation worker panicked");
            } else {
                log::info!("Simulation worker stopped");
            }
        }
    }
}

impl Drop for SimulationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(running: &AtomicBool, phase: &Mutex<f32>) {
    let mut last_step = Instant::now();

    while running.load(Ordering::Relaxed) {
        let now = Instant::now();
        let dt = now.duration_since(last_step).as_secs_f32();
        last_step = now;

        {
            // Lock scoped to the read/update alone
            let mut value = phase.lock().unwrap();
            *value += dt * SIM_SPEED;
            if *value > TWO_PI {
                *value -= TWO_PI;
            }
        }

        // Dummy workload standing in for a demanding simulation step
        let mut acc = 0.0f64;
        for i in 0..1_000_000u32 {
            acc += f64::from(i).sin();
        }
        std::hint::black_box(acc);

        std::thread::sleep(STEP_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_advances_and_stays_in_range() {
        let mut worker = SimulationWorker::spawn();
        std::thread::sleep(Duration::from_millis(50));

        let phase = worker.phase();
        assert!(phase >= 0.0);
        assert!(phase < TWO_PI);

        worker.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut worker = SimulationWorker::spawn();
        worker.stop();
        worker.stop(); // second call must not panic or hang
    }

    #[test]
    fn test_drop_joins_the_thread() {
        let worker = SimulationWorker::spawn();
        drop(worker); // must not leave the thread running
    }
}
