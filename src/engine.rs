use std::collections::BTreeSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::bank::{Question, Section};

/// One user's quiz attempt. Created on section pick, carried in the dialogue
/// state, and replaced by the finished [`Report`] after the last confirm.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    category: String,
    question_index: usize,
    pending: BTreeSet<usize>,
    recorded: Vec<BTreeSet<usize>>,
}

#[derive(Debug)]
pub enum Step {
    Next(QuizSession),
    Done(Report),
}

#[derive(Debug)]
pub enum View<'a> {
    Question(QuestionView<'a>),
    Finished(Report),
}

#[derive(Debug)]
pub struct QuestionView<'a> {
    pub index: usize,
    pub total: usize,
    pub question: &'a Question,
    pub order: Vec<usize>,
    pub pending: &'a BTreeSet<usize>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub section: String,
    pub score: usize,
    pub total: usize,
    pub percent: u32,
    pub grade: Grade,
    pub missed: Vec<MissedQuestion>,
}

#[derive(Debug, Clone)]
pub struct MissedQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub selected: BTreeSet<usize>,
    pub correct: BTreeSet<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Good,
    Satisfactory,
    Poor,
}

impl QuizSession {
    pub fn start(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            question_index: 0,
            pending: BTreeSet::new(),
            recorded: Vec::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn pending(&self) -> &BTreeSet<usize> {
        &self.pending
    }

    /// Flips membership of a canonical option index in the pending selection.
    /// An index outside `[0, option_count)` leaves the session untouched and
    /// returns `false`.
    pub fn toggle(&mut self, option_index: usize, option_count: usize) -> bool {
        if option_index >= option_count {
            return false;
        }

        if !self.pending.remove(&option_index) {
            self.pending.insert(option_index);
        }

        true
    }

    /// Records the pending selection for the current question and advances.
    /// An empty pending set is a legal submission. Returns the report once
    /// the last question has been answered.
    pub fn confirm(mut self, section: &Section) -> Step {
        let answer = std::mem::take(&mut self.pending);
        self.recorded.push(answer);
        self.question_index += 1;

        if self.question_index >= section.questions().len() {
            Step::Done(Report::compute(&self, section))
        } else {
            Step::Next(self)
        }
    }

    pub fn next_view<'a>(&'a self, section: &'a Section) -> View<'a> {
        match section.questions().get(self.question_index) {
            Some(question) => View::Question(QuestionView {
                index: self.question_index,
                total: section.questions().len(),
                question,
                order: display_order(self.question_index, question.options().len()),
                pending: &self.pending,
            }),
            None => View::Finished(Report::compute(self, section)),
        }
    }
}

/// Display order for a question's options. Seeded purely by the question
/// index, so re-renders of one question are stable while different questions
/// shuffle independently. Cosmetic only: grading uses canonical indices.
pub fn display_order(question_index: usize, option_count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..option_count).collect();
    let mut rng = StdRng::seed_from_u64(question_index as u64);
    order.shuffle(&mut rng);
    order
}

impl Report {
    /// A question counts as correct iff the recorded selection equals the
    /// set of correct option indices. No partial credit.
    pub fn compute(session: &QuizSession, section: &Section) -> Self {
        let total = section.questions().len();
        let mut score = 0;
        let mut missed = Vec::new();

        for (i, question) in section.questions().iter().enumerate() {
            let correct = question.correct_set();
            let selected = session.recorded.get(i).cloned().unwrap_or_default();

            if selected == correct {
                score += 1;
            } else {
                missed.push(MissedQuestion {
                    text: question.text().to_owned(),
                    options: question
                        .options()
                        .iter()
                        .map(|option| option.label().to_owned())
                        .collect(),
                    selected,
                    correct,
                });
            }
        }

        let percent = if total == 0 {
            0
        } else {
            // round half-up
            (score as f64 / total as f64 * 100.0).round() as u32
        };

        Self {
            section: session.category.clone(),
            score,
            total,
            percent,
            grade: Grade::from_percent(percent),
            missed,
        }
    }
}

impl Grade {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            90.. => Grade::Excellent,
            70.. => Grade::Good,
            50.. => Grade::Satisfactory,
            _ => Grade::Poor,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Satisfactory => "Satisfactory",
            Grade::Poor => "Poor",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::AnswerOption;

    fn question(correct: &[bool]) -> Question {
        let options = correct
            .iter()
            .enumerate()
            .map(|(i, &is_correct)| AnswerOption::new(format!("option {i}"), is_correct))
            .collect();
        Question::new("question", options, None)
    }

    // Q1 correct {0}, Q2 correct {1, 2}
    fn general_section() -> Section {
        Section::new(
            "General",
            vec![
                question(&[true, false, false]),
                question(&[false, true, true]),
            ],
        )
    }

    fn confirm_expect_next(session: QuizSession, section: &Section) -> QuizSession {
        match session.confirm(section) {
            Step::Next(session) => session,
            Step::Done(report) => panic!("quiz ended early: {report:?}"),
        }
    }

    fn confirm_expect_done(session: QuizSession, section: &Section) -> Report {
        match session.confirm(section) {
            Step::Next(_) => panic!("quiz did not end"),
            Step::Done(report) => report,
        }
    }

    #[test]
    fn start_is_fresh() {
        let session = QuizSession::start("General");
        assert_eq!(session.question_index(), 0);
        assert!(session.pending().is_empty());
        assert!(session.recorded.is_empty());
    }

    #[test]
    fn toggle_is_self_inverse() {
        let mut session = QuizSession::start("General");
        assert!(session.toggle(1, 3));
        assert_eq!(session.pending(), &BTreeSet::from([1]));
        assert!(session.toggle(1, 3));
        assert!(session.pending().is_empty());
    }

    #[test]
    fn toggle_out_of_range_is_rejected() {
        let mut session = QuizSession::start("General");
        assert!(!session.toggle(3, 3));
        assert!(session.pending().is_empty());
    }

    #[test]
    fn confirm_advances_by_one_and_clears_pending() {
        let section = general_section();
        let mut session = QuizSession::start(section.name());
        session.toggle(0, 3);

        let session = confirm_expect_next(session, &section);
        assert_eq!(session.question_index(), 1);
        assert!(session.pending().is_empty());
        assert_eq!(session.recorded, vec![BTreeSet::from([0])]);
    }

    #[test]
    fn grading_is_exact_set_equality() {
        // correct set {0, 2}
        let section = Section::new("Strict", vec![question(&[true, false, true])]);

        for (picks, expected_score) in [
            (vec![0, 2], 1),
            (vec![0], 0),
            (vec![0, 1, 2], 0),
            (vec![], 0),
        ] {
            let mut session = QuizSession::start(section.name());
            for index in picks {
                session.toggle(index, 3);
            }
            let report = confirm_expect_done(session, &section);
            assert_eq!(report.score, expected_score);
        }
    }

    // answers the first `right` questions correctly and the rest wrong
    fn run_with_score(right: usize, total: usize) -> Report {
        let section = Section::new(
            "Rounding",
            (0..total).map(|_| question(&[true, false])).collect(),
        );
        let mut session = QuizSession::start(section.name());

        for i in 0..total {
            session.toggle(if i < right { 0 } else { 1 }, 2);
            session = match session.confirm(&section) {
                Step::Next(session) => session,
                Step::Done(report) => return report,
            };
        }
        panic!("section had no questions");
    }

    #[test]
    fn percent_rounds_half_up() {
        let cases = [(7usize, 9usize, 78u32), (1, 3, 33), (1, 2, 50), (0, 4, 0)];
        for (score, total, expected) in cases {
            let report = run_with_score(score, total);
            assert_eq!(report.score, score);
            assert_eq!(report.percent, expected, "{score}/{total}");
        }
    }

    #[test]
    fn grade_boundaries_are_closed_above() {
        assert_eq!(Grade::from_percent(100), Grade::Excellent);
        assert_eq!(Grade::from_percent(90), Grade::Excellent);
        assert_eq!(Grade::from_percent(89), Grade::Good);
        assert_eq!(Grade::from_percent(70), Grade::Good);
        assert_eq!(Grade::from_percent(69), Grade::Satisfactory);
        assert_eq!(Grade::from_percent(50), Grade::Satisfactory);
        assert_eq!(Grade::from_percent(49), Grade::Poor);
        assert_eq!(Grade::from_percent(0), Grade::Poor);
    }

    #[test]
    fn perfect_run_scores_excellent() {
        let section = general_section();
        let mut session = QuizSession::start(section.name());

        session.toggle(0, 3);
        let mut session = confirm_expect_next(session, &section);

        session.toggle(1, 3);
        session.toggle(2, 3);
        let report = confirm_expect_done(session, &section);

        assert_eq!(report.score, 2);
        assert_eq!(report.total, 2);
        assert_eq!(report.percent, 100);
        assert_eq!(report.grade, Grade::Excellent);
        assert!(report.missed.is_empty());
    }

    #[test]
    fn failed_run_records_missed_questions_verbatim() {
        let section = general_section();
        let mut session = QuizSession::start(section.name());

        session.toggle(1, 3);
        let mut session = confirm_expect_next(session, &section);

        // {1} is wrong again, the correct set is {1, 2}
        session.toggle(1, 3);
        let report = confirm_expect_done(session, &section);

        assert_eq!(report.score, 0);
        assert_eq!(report.percent, 0);
        assert_eq!(report.grade, Grade::Poor);
        assert_eq!(report.missed.len(), 2);

        assert_eq!(report.missed[0].selected, BTreeSet::from([1]));
        assert_eq!(report.missed[0].correct, BTreeSet::from([0]));
        assert_eq!(report.missed[1].selected, BTreeSet::from([1]));
        assert_eq!(report.missed[1].correct, BTreeSet::from([1, 2]));
        assert_eq!(
            report.missed[0].options,
            vec!["option 0", "option 1", "option 2"]
        );
    }

    #[test]
    fn empty_confirm_only_matches_empty_correct_set() {
        let section = Section::new("Odd", vec![question(&[false, false])]);
        let session = QuizSession::start(section.name());
        let report = confirm_expect_done(session, &section);
        assert_eq!(report.score, 1);
    }

    #[test]
    fn restart_leaves_no_leakage() {
        let section = general_section();
        let mut session = QuizSession::start(section.name());
        session.toggle(1, 3);
        let session = confirm_expect_next(session, &section);
        drop(session);

        let fresh = QuizSession::start(section.name());
        assert_eq!(fresh.question_index(), 0);
        assert!(fresh.pending().is_empty());
        assert!(fresh.recorded.is_empty());
    }

    #[test]
    fn next_view_projects_current_question() {
        let section = general_section();
        let mut session = QuizSession::start(section.name());
        session.toggle(2, 3);

        match session.next_view(&section) {
            View::Question(view) => {
                assert_eq!(view.index, 0);
                assert_eq!(view.total, 2);
                assert_eq!(view.pending, &BTreeSet::from([2]));
            }
            View::Finished(_) => panic!("expected a question"),
        }
    }

    #[test]
    fn next_view_past_the_end_is_the_report() {
        let section = Section::new("Tiny", vec![question(&[true])]);
        let mut session = QuizSession::start(section.name());
        session.toggle(0, 1);
        let report = confirm_expect_done(session, &section);
        assert_eq!(report.percent, 100);
    }

    #[test]
    fn display_order_is_stable_per_index() {
        assert_eq!(display_order(4, 5), display_order(4, 5));
        let order = display_order(7, 6);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_section_reports_zero_percent() {
        let section = Section::new("Empty", vec![]);
        let session = QuizSession::start(section.name());
        match session.next_view(&section) {
            View::Finished(report) => {
                assert_eq!(report.total, 0);
                assert_eq!(report.percent, 0);
                assert_eq!(report.grade, Grade::Poor);
            }
            View::Question(_) => panic!("empty section has no questions"),
        }
    }
}
