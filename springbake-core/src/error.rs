use thiserror::Error;

/// Failures reported by the simulation engine.
///
/// Every variant carries enough context (controller, frame, field) for the
/// surrounding tool to tell the artist what to change. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpringError {
    #[error("invalid parameter `{field}`: {value}")]
    InvalidParameters { field: &'static str, value: String },
    #[error("no controllers supplied")]
    EmptyChain,
    #[error("simulation became unstable on `{controller}` at frame {frame}")]
    UnstableSimulation { controller: String, frame: i64 },
    #[error("goal signal has no value at frame {frame}")]
    GoalUnavailable { frame: i64 },
    #[error("preview is not armed")]
    PreviewNotArmed,
    #[error("preview expected frame {expected} but the host ticked frame {got}; re-arm and play from the start")]
    PlaybackDiscontinuity { expected: i64, got: i64 },
    #[error("bake cancelled at frame {frame}")]
    Cancelled { frame: i64 },
    #[error("invalid frame range {start}..={end}")]
    InvalidFrameRange { start: i64, end: i64 },
}

impl SpringError {
    pub(crate) fn invalid(field: &'static str, value: impl ToString) -> Self {
        Self::InvalidParameters { field, value: value.to_string() }
    }

    /// True for the variant the runners raise when a sample stops being finite.
    pub fn is_unstable(&self) -> bool {
        matches!(self, Self::UnstableSimulation { .. })
    }
}

pub type Result<T> = std::result::Result<T, SpringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_context() {
        let e = SpringError::UnstableSimulation { controller: "tail_02".into(), frame: 40 };
        assert_eq!(e.to_string(), "simulation became unstable on `tail_02` at frame 40");
        assert!(e.is_unstable());
        let e = SpringError::invalid("stiffness", -1.0);
        assert_eq!(e.to_string(), "invalid parameter `stiffness`: -1");
    }
}
