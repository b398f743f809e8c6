//! Vote tallying with a no-execution-on-tie policy.

use serde::Serialize;

/// A single cast vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ballot {
    pub voter: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TallyResult {
    /// Everyone abstained.
    NoVotes,
    /// Exactly one target holds the maximum.
    Lynch { target: String, votes: u32 },
    /// Several targets share the maximum; nobody is executed.
    Tie { targets: Vec<String>, votes: u32 },
}

impl TallyResult {
    pub fn lynched(&self) -> Option<&str> {
        match self {
            TallyResult::Lynch { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Count ballots per target. Tied targets are listed in order of their first vote.
pub fn tally(ballots: &[Ballot]) -> TallyResult {
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for ballot in ballots {
        match counts
            .iter_mut()
            .find(|(target, _)| *target == ballot.target)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((ballot.target.as_str(), 1)),
        }
    }

    let Some(max) = counts.iter().map(|(_, count)| *count).max() else {
        return TallyResult::NoVotes;
    };
    let mut leaders: Vec<String> = counts
        .iter()
        .filter(|(_, count)| *count == max)
        .map(|(target, _)| target.to_string())
        .collect();

    if leaders.len() == 1 {
        TallyResult::Lynch {
            target: leaders.remove(0),
            votes: max,
        }
    } else {
        TallyResult::Tie {
            targets: leaders,
            votes: max,
        }
    }
}
