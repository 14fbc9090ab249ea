//! TaskState - RetriableTask の状態遷移
//!
//! ```text
//! Created -> Running -> { Succeeded, FailedTerminal, Cancelled }
//!               |
//!               +-> RetryPending -> Running (2 回目、最大 1 回)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Created,
    Running,
    /// 1 回目が失敗し、recovery task を実行中
    RetryPending,
    Succeeded,
    FailedTerminal,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::FailedTerminal | TaskState::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::created(TaskState::Created, false)]
    #[case::running(TaskState::Running, false)]
    #[case::retry_pending(TaskState::RetryPending, false)]
    #[case::succeeded(TaskState::Succeeded, true)]
    #[case::failed(TaskState::FailedTerminal, true)]
    #[case::cancelled(TaskState::Cancelled, true)]
    fn terminal_states(#[case] state: TaskState, #[case] terminal: bool) {
        assert_eq!(state.is_terminal(), terminal);
    }

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&TaskState::RetryPending).unwrap();
        assert_eq!(s, "\"retry_pending\"");
    }
}
