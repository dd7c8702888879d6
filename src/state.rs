use crate::engine::{QuizSession, Report};

#[derive(Debug, Clone, Default)]
pub enum QuizState {
    /// Waiting for a section pick from the reply keyboard.
    #[default]
    Start,
    Answering {
        session: QuizSession,
    },
    /// The attempt is scored; the report sticks around for the details view
    /// until the user restarts.
    Reporting {
        report: Report,
    },
}
