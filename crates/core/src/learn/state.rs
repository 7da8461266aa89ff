//! LEARN run state machine

use std::fmt;

use serde::{Deserialize, Serialize};
use statsampler_domain::TableName;

/// Position of a LEARN run.
///
/// `Idle → ProcessingTable(0) → … → ProcessingTable(n-1) → Training → Done`,
/// with `Failed` reachable from any processing or training state and
/// `Cancelled` from the checkpoint after each table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LearnState {
    Idle,
    ProcessingTable { index: usize, table: TableName },
    Training,
    Done,
    /// `table` is absent when training itself failed
    Failed { table: Option<TableName> },
    Cancelled { completed: usize },
}

impl LearnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. } | Self::Cancelled { .. })
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &LearnState) -> bool {
        use LearnState::{Cancelled, Done, Failed, Idle, ProcessingTable, Training};

        match (self, next) {
            (Idle, ProcessingTable { index: 0, .. }) => true,
            (ProcessingTable { index: current, .. }, ProcessingTable { index: following, .. }) => {
                *following == current + 1
            }
            (Idle | ProcessingTable { .. }, Training) => true,
            (ProcessingTable { .. }, Failed { table: Some(_) }) => true,
            (Training, Failed { table: None }) => true,
            (Idle | ProcessingTable { .. }, Cancelled { .. }) => true,
            (Training, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for LearnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::ProcessingTable { index, table } => write!(f, "processing_table({index}, {table})"),
            Self::Training => f.write_str("training"),
            Self::Done => f.write_str("done"),
            Self::Failed { table: Some(table) } => write!(f, "failed({table})"),
            Self::Failed { table: None } => f.write_str("failed"),
            Self::Cancelled { completed } => write!(f, "cancelled({completed})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processing(index: usize, name: &str) -> LearnState {
        LearnState::ProcessingTable { index, table: TableName::parse(name).unwrap() }
    }

    #[test]
    fn happy_path_transitions_are_legal() {
        let path = [
            LearnState::Idle,
            processing(0, "a"),
            processing(1, "b"),
            LearnState::Training,
            LearnState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(LearnState::Done.is_terminal());
    }

    #[test]
    fn tables_cannot_be_skipped_or_revisited() {
        assert!(!LearnState::Idle.can_transition_to(&processing(1, "b")));
        assert!(!processing(1, "b").can_transition_to(&processing(0, "a")));
        assert!(!processing(0, "a").can_transition_to(&LearnState::Done));
    }

    #[test]
    fn failure_carries_table_only_while_processing() {
        let failed_table = LearnState::Failed { table: Some(TableName::parse("a").unwrap()) };
        let failed_training = LearnState::Failed { table: None };

        assert!(processing(0, "a").can_transition_to(&failed_table));
        assert!(!processing(0, "a").can_transition_to(&failed_training));
        assert!(LearnState::Training.can_transition_to(&failed_training));
        assert!(!LearnState::Done.can_transition_to(&failed_training));
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(processing(2, "sales.orders").to_string(), "processing_table(2, sales.orders)");
        assert_eq!(LearnState::Cancelled { completed: 3 }.to_string(), "cancelled(3)");
    }
}
