use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Implementation,
    Intrinsic,
    Extrinsic,
    Achievement,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Implementation => write!(f, "implementation"),
            MessageKind::Intrinsic => write!(f, "intrinsic"),
            MessageKind::Extrinsic => write!(f, "extrinsic"),
            MessageKind::Achievement => write!(f, "achievement"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotivationalMessage {
    pub title: &'static str,
    pub body: &'static str,
    pub kind: MessageKind,
}

const fn message(title: &'static str, body: &'static str, kind: MessageKind) -> MotivationalMessage {
    MotivationalMessage { title, body, kind }
}

/// Sent whenever a message cannot be built from the user's data.
pub const DEFAULT_MESSAGE: MotivationalMessage = message(
    "Let's get back to your tasks!",
    "You've made great progress. Keep it up!",
    MessageKind::Implementation,
);

pub const IMPLEMENTATION_MESSAGES: [MotivationalMessage; 3] = [
    message(
        "Plan your next step",
        "When you finish your current task, then immediately start the next one in your list!",
        MessageKind::Implementation,
    ),
    message(
        "Create a specific plan",
        "When will you work on this task? Set a specific time to increase your chances of success!",
        MessageKind::Implementation,
    ),
    message(
        "Make it concrete",
        "Where exactly will you complete this task? Setting a specific location helps follow-through!",
        MessageKind::Implementation,
    ),
];

pub const INTRINSIC_MESSAGES: [MotivationalMessage; 3] = [
    message(
        "Find your purpose",
        "Remember why this task matters to you personally. How does it connect to your values?",
        MessageKind::Intrinsic,
    ),
    message(
        "Celebrate growth",
        "Each task you complete is helping you develop your skills and abilities!",
        MessageKind::Intrinsic,
    ),
    message(
        "Autonomy boost",
        "You chose this goal because it matters to you. You have the power to accomplish it!",
        MessageKind::Intrinsic,
    ),
];

pub const ACHIEVEMENT_MESSAGES: [MotivationalMessage; 3] = [
    message(
        "You're on a streak!",
        "Keep the momentum going. You've completed tasks 3 days in a row!",
        MessageKind::Achievement,
    ),
    message(
        "Almost there!",
        "You've completed most of your tasks this week. Finish strong!",
        MessageKind::Achievement,
    ),
    message(
        "New personal best!",
        "You completed more tasks yesterday than any previous day this month!",
        MessageKind::Achievement,
    ),
];

pub const EXTRINSIC_MESSAGES: [MotivationalMessage; 3] = [
    message(
        "Reward yourself",
        "Once you complete this important task, treat yourself to something you enjoy!",
        MessageKind::Extrinsic,
    ),
    message(
        "Deadline approaching",
        "Don't miss out on completing this task on time!",
        MessageKind::Extrinsic,
    ),
    message(
        "Progress update",
        "You're building a habit of finishing what you start. Keep building on your success!",
        MessageKind::Extrinsic,
    ),
];

/// Which set of messages a user should hear from next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageFamily {
    Implementation,
    Intrinsic,
    /// Achievement and extrinsic variants together.
    Achievement,
}

impl MessageFamily {
    pub fn variants(&self) -> Vec<MotivationalMessage> {
        match self {
            MessageFamily::Implementation => IMPLEMENTATION_MESSAGES.to_vec(),
            MessageFamily::Intrinsic => INTRINSIC_MESSAGES.to_vec(),
            MessageFamily::Achievement => ACHIEVEMENT_MESSAGES
                .iter()
                .chain(EXTRINSIC_MESSAGES.iter())
                .copied()
                .collect(),
        }
    }

    /// Uniform pick among [`variants`](Self::variants).
    pub fn pick(&self, rng: &mut fastrand::Rng) -> MotivationalMessage {
        let variants = self.variants();
        variants[rng.usize(..variants.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(MessageFamily::Implementation, 3)]
    #[case(MessageFamily::Intrinsic, 3)]
    #[case(MessageFamily::Achievement, 6)]
    fn every_family_has_at_least_three_variants(#[case] family: MessageFamily, #[case] expected: usize) {
        assert_eq!(family.variants().len(), expected);
    }

    #[test]
    fn picks_stay_inside_the_family() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..50 {
            let picked = MessageFamily::Achievement.pick(&mut rng);
            assert!(matches!(picked.kind, MessageKind::Achievement | MessageKind::Extrinsic));
            assert_eq!(MessageFamily::Intrinsic.pick(&mut rng).kind, MessageKind::Intrinsic);
        }
    }

    #[test]
    fn seeded_picks_are_reproducible() {
        let a = MessageFamily::Implementation.pick(&mut fastrand::Rng::with_seed(42));
        let b = MessageFamily::Implementation.pick(&mut fastrand::Rng::with_seed(42));
        assert_eq!(a, b);
    }
}
