use std::time::Duration;

/// Timing of the crossfade and same-track volume envelopes.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeConfig {
    pub fade_duration: Duration,
    pub fade_steps: u32,
    pub volume_fade_duration: Duration,
    pub volume_fade_steps: u32,
    /// Volume changes smaller than this are applied without animating.
    pub volume_snap_tolerance: f32,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            fade_duration: Duration::from_millis(1000),
            fade_steps: 20,
            volume_fade_duration: Duration::from_millis(500),
            volume_fade_steps: 10,
            volume_snap_tolerance: 0.05,
        }
    }
}

impl FadeConfig {
    pub fn with_fade(mut self, duration: Duration, steps: u32) -> Self {
        self.fade_duration = duration;
        self.fade_steps = steps.max(1);
        self
    }

    pub fn with_volume_fade(mut self, duration: Duration, steps: u32) -> Self {
        self.volume_fade_duration = duration;
        self.volume_fade_steps = steps.max(1);
        self
    }

    pub fn fade_step_interval(&self) -> Duration {
        step_interval(self.fade_duration, self.fade_steps)
    }

    pub fn volume_step_interval(&self) -> Duration {
        step_interval(self.volume_fade_duration, self.volume_fade_steps)
    }
}

// tokio intervals panic on a zero period
fn step_interval(total: Duration, steps: u32) -> Duration {
    (total / steps.max(1)).max(Duration::from_millis(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_intervals() {
        let config = FadeConfig::default();
        assert_eq!(config.fade_step_interval(), Duration::from_millis(50));
        assert_eq!(config.volume_step_interval(), Duration::from_millis(50));
    }

    #[test]
    fn zero_steps_and_durations_are_sanitized() {
        let config = FadeConfig::default()
            .with_fade(Duration::ZERO, 0)
            .with_volume_fade(Duration::from_millis(300), 0);

        assert_eq!(config.fade_steps, 1);
        assert_eq!(config.fade_step_interval(), Duration::from_millis(1));
        assert_eq!(config.volume_fade_steps, 1);
        assert_eq!(config.volume_step_interval(), Duration::from_millis(300));
    }
}
