//! State vocabulary for the hierarchical machines.
//!
//! Transition functions here are total: every (state, input) pair maps to
//! exactly one next state via exhaustive matches, so an unmapped combination
//! is a compile error rather than a runtime surprise.

use crate::motion::Steer;

/// Sub-states of the line-following loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    Straight,
    VeerLeft,
    VeerRight,
    /// Terminal: the profile's loss condition held.
    Lost,
}

impl FollowState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::Lost
    }
}

/// Next follow sub-state for a steering decision. Total over `Steer`.
#[inline]
pub fn follow_transition(steer: &Steer) -> FollowState {
    match steer {
        Steer::Straight(_) => FollowState::Straight,
        Steer::VeerLeft(_) => FollowState::VeerLeft,
        Steer::VeerRight(_) => FollowState::VeerRight,
        Steer::Lost => FollowState::Lost,
    }
}

/// Sub-states of line acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindLineState {
    SeekStraight,
    PivotOntoLine,
    /// Terminal.
    Acquired,
}

/// Terminal outcome of a deadline-bounded follow segment. The two conditions
/// race; whichever is satisfied first on the tick loop wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// The deadline elapsed while still following.
    SegmentComplete,
    /// The loss condition held before the deadline.
    Lost,
}

/// Top-level supervisory states. There is no terminal state; the robot runs
/// until powered off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Start,
    FindLine,
    Follow,
    TimedFollow1,
    TimedFollow2,
    Stop,
    ResumeFollow,
}

impl SupervisorState {
    /// Display label announced on entry.
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::FindLine => "FIND_LINE",
            Self::Follow => "FOLLOW",
            Self::TimedFollow1 => "TIMED_FOLLOW_1",
            Self::TimedFollow2 => "TIMED_FOLLOW_2",
            Self::Stop => "STOP",
            Self::ResumeFollow => "RESUME",
        }
    }
}
