use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// Accumulated wall-clock time per pipeline stage
#[derive(Debug, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        match self.steps.iter_mut().find(|s| s.name == name) {
            Some(step) => step.duration += duration,
            None => self.steps.push(StepTiming { name, duration }),
        }
    }

    pub fn record(&mut self, timer: Timer) {
        let (name, duration) = timer.stop();
        self.add_step(name, duration);
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.steps.iter().find(|s| s.name == name).map(|s| s.duration)
    }

    /// Stages in the order they first ran, with their accumulated durations.
    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                (step.duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            info!(
                "{:<12} {:>12.3}ms ({:>5.1}%)",
                step.name,
                step.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        info!("{:<12} {:>12.3}ms", "total", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_steps_accumulate_in_first_run_order() {
        let mut timings = PipelineTimings::new();
        timings.add_step("decode", Duration::from_millis(5));
        timings.add_step("compute", Duration::from_millis(20));
        timings.add_step("decode", Duration::from_millis(7));

        let steps = timings.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].name, "decode");
        assert_eq!(steps[0].duration, Duration::from_millis(12));
        assert_eq!(timings.get_step("compute"), Some(Duration::from_millis(20)));
        assert_eq!(timings.total_duration(), Duration::from_millis(32));
        assert_eq!(timings.get_step("missing"), None);
    }

    #[test]
    fn each_step_is_listed_once() {
        let mut timings = PipelineTimings::new();
        for _ in 0..3 {
            timings.add_step("read_frame", Duration::from_millis(1));
            timings.add_step("decode", Duration::from_millis(2));
        }

        let names: Vec<&str> = timings.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["read_frame", "decode"]);
        assert_eq!(timings.steps()[1].duration, Duration::from_millis(6));
    }

    #[test]
    fn timer_records_its_name() {
        let mut timings = PipelineTimings::new();
        timings.record(Timer::start("read_frame"));
        assert!(timings.get_step("read_frame").is_some());
    }
}
