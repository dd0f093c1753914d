/// Dialogue and question content, loaded from RON.
///
/// Both files are flat maps keyed by dotted paths such as
/// `rooms.tlb_room.at_spawn`. Templates are parsed once at load time.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use super::template::Template;
use crate::schema::player::Vars;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Guide lines by path.
#[derive(Debug, Clone, Default)]
pub struct DialogueBook {
    entries: HashMap<String, Vec<Template>>,
}

impl DialogueBook {
    pub fn load_from_ron(path: &Path) -> Result<DialogueBook, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<DialogueBook, ContentError> {
        let raw: HashMap<String, Vec<String>> = ron::from_str(input)?;
        let mut book = DialogueBook::default();
        for (path, lines) in raw {
            book.insert(&path, &lines);
        }
        Ok(book)
    }

    pub fn insert<S: AsRef<str>>(&mut self, path: &str, lines: &[S]) {
        let templates = lines.iter().map(|l| Template::parse(l.as_ref())).collect();
        self.entries.insert(path.to_string(), templates);
    }

    /// Entries from `other` replace entries with the same path.
    pub fn merge(&mut self, other: DialogueBook) {
        self.entries.extend(other.entries);
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All lines at `path`, rendered against `vars`.
    pub fn lines(&self, path: &str, vars: &Vars) -> Option<Vec<String>> {
        self.entries
            .get(path)
            .map(|lines| lines.iter().map(|t| t.render(vars)).collect())
    }

    /// The first line at `path`, rendered against `vars`.
    pub fn get_line(&self, path: &str, vars: &Vars) -> Option<String> {
        self.entries
            .get(path)
            .and_then(|lines| lines.first())
            .map(|t| t.render(vars))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn templates(&self, path: &str) -> Option<&[Template]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub const DEFAULT_WRONG_FEEDBACK: &str = "That's incorrect, try again.";

/// A quiz question. Without options it is answered in free text.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: Template,
    /// Ordered `(label, text)` pairs, shown as `A) text`.
    pub options: Vec<(String, Template)>,
    /// Expected reply. May itself contain placeholders.
    pub correct: Template,
    pub wrong: Template,
}

impl Question {
    pub fn new(text: &str, correct: &str) -> Self {
        Self {
            text: Template::parse(text),
            options: Vec::new(),
            correct: Template::parse(correct),
            wrong: Template::parse(DEFAULT_WRONG_FEEDBACK),
        }
    }

    pub fn with_option(mut self, label: &str, text: &str) -> Self {
        self.options.push((label.to_string(), Template::parse(text)));
        self
    }

    pub fn with_wrong(mut self, wrong: &str) -> Self {
        self.wrong = Template::parse(wrong);
        self
    }

    /// Case-insensitive, trimmed, exact comparison.
    pub fn check_answer(&self, reply: &str, vars: &Vars) -> bool {
        let expected = self.correct.render(vars);
        expected.trim().eq_ignore_ascii_case(reply.trim())
    }

    /// The question followed by its option lines.
    pub fn prompt_lines(&self, vars: &Vars) -> Vec<String> {
        let mut lines = vec![self.text.render(vars)];
        for (label, text) in &self.options {
            lines.push(format!("{}) {}", label, text.render(vars)));
        }
        lines
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Question")]
struct RonQuestion {
    question: String,
    #[serde(default)]
    options: Vec<(String, String)>,
    correct: String,
    #[serde(default)]
    wrong: Option<String>,
}

/// Questions by path.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: HashMap<String, Question>,
}

impl QuestionBank {
    pub fn load_from_ron(path: &Path) -> Result<QuestionBank, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<QuestionBank, ContentError> {
        let raw: HashMap<String, RonQuestion> = ron::from_str(input)?;
        let mut bank = QuestionBank::default();
        for (path, q) in raw {
            let mut question = Question::new(&q.question, &q.correct);
            for (label, text) in &q.options {
                question = question.with_option(label, text);
            }
            if let Some(wrong) = &q.wrong {
                question = question.with_wrong(wrong);
            }
            bank.insert(&path, question);
        }
        Ok(bank)
    }

    pub fn insert(&mut self, path: &str, question: Question) {
        self.questions.insert(path.to_string(), question);
    }

    pub fn merge(&mut self, other: QuestionBank) {
        self.questions.extend(other.questions);
    }

    pub fn get(&self, path: &str) -> Option<&Question> {
        self.questions.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.questions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
