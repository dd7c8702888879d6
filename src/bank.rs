use std::collections::BTreeSet;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct QuestionBank {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    name: String,
    questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    text: String,
    options: Vec<AnswerOption>,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerOption {
    label: String,
    correct: bool,
}

impl QuestionBank {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let file = File::open(path.as_ref())?;
        let sections: Vec<Section> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::new(sections))
    }

    pub fn new(sections: Vec<Section>) -> Self {
        for section in &sections {
            for question in section.questions() {
                if question.correct_set().is_empty() {
                    log::warn!(
                        "'{}': question '{}' has no correct option",
                        section.name(),
                        question.text()
                    );
                }
            }
        }

        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name() == name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|section| section.name()).collect()
    }
}

impl Section {
    pub fn new(name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            name: name.into(),
            questions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

impl Question {
    pub fn new(text: impl Into<String>, options: Vec<AnswerOption>, image: Option<String>) -> Self {
        Self {
            text: text.into(),
            options,
            image,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn correct_set(&self) -> BTreeSet<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| option.is_correct())
            .map(|(i, _)| i)
            .collect()
    }
}

impl AnswerOption {
    pub fn new(label: impl Into<String>, correct: bool) -> Self {
        Self {
            label: label.into(),
            correct,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_correct(&self) -> bool {
        self.correct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bank_json() {
        let raw = r#"[
            {
                "name": "General",
                "questions": [
                    {
                        "text": "Pick the even numbers.",
                        "options": [
                            { "label": "2", "correct": true },
                            { "label": "3", "correct": false },
                            { "label": "4", "correct": true }
                        ]
                    }
                ]
            }
        ]"#;

        let sections: Vec<Section> = serde_json::from_str(raw).unwrap();
        let bank = QuestionBank::new(sections);

        assert_eq!(bank.section_names(), vec!["General"]);
        let section = bank.get("General").unwrap();
        assert_eq!(section.questions().len(), 1);

        let question = &section.questions()[0];
        assert_eq!(question.image(), None);
        assert_eq!(
            question.correct_set(),
            BTreeSet::from([0, 2]),
        );
    }

    #[test]
    fn unknown_section_is_none() {
        let bank = QuestionBank::new(vec![Section::new("General", vec![])]);
        assert!(bank.get("Missing").is_none());
    }

    #[test]
    fn section_order_is_preserved() {
        let bank = QuestionBank::new(vec![
            Section::new("B", vec![]),
            Section::new("A", vec![]),
        ]);
        assert_eq!(bank.section_names(), vec!["B", "A"]);
    }
}
