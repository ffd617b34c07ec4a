use kinetic_animation::AnimationConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Worker count for the job pool; `None` lets rayon decide.
    pub worker_threads: Option<usize>,
    /// Run animator jobs on the pool. When false they run in order on the
    /// calling thread.
    pub parallel: bool,
    pub animation: AnimationConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            parallel: true,
            animation: AnimationConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn serial() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_animation_config_parses() {
        let cfg = SchedulerConfig::from_json_str(
            r#"{ "worker_threads": 2, "animation": { "loop_mode": "ping_pong" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.worker_threads, Some(2));
        assert!(cfg.parallel);
        assert_eq!(cfg.animation.loop_mode, kinetic_animation::LoopMode::PingPong);
    }
}
