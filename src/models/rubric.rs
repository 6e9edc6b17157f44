use std::fmt;

/// Number of questions on every exam and entries in the rubric.
pub const NUM_QUESTIONS: usize = 5;

/// One line of the rubric, e.g. `"1, A"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubricEntry {
    pub question_number: u32,
    pub rubric_char: char,
}

impl RubricEntry {
    pub fn new(question_number: u32, rubric_char: char) -> Self {
        Self {
            question_number,
            rubric_char,
        }
    }

    /// Move `rubric_char` to its successor.
    ///
    /// Returns the previous character, or `None` when the successor is not a valid
    /// `char` (the entry is then left as is).
    pub fn advance(&mut self) -> Option<char> {
        let old = self.rubric_char;
        let next = char::from_u32(old as u32 + 1)?;
        self.rubric_char = next;
        Some(old)
    }
}

impl fmt::Display for RubricEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.question_number, self.rubric_char)
    }
}

/// The full rubric, always exactly [`NUM_QUESTIONS`] entries in question order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    entries: [RubricEntry; NUM_QUESTIONS],
}

impl Rubric {
    pub fn new(entries: [RubricEntry; NUM_QUESTIONS]) -> Self {
        Self { entries }
    }

    /// Rubric `1, c` .. `5, c`
    pub fn uniform(rubric_char: char) -> Self {
        Self::new(std::array::from_fn(|i| {
            RubricEntry::new(i as u32 + 1, rubric_char)
        }))
    }

    pub fn entries(&self) -> &[RubricEntry; NUM_QUESTIONS] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&RubricEntry> {
        self.entries.get(index)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut RubricEntry> {
        self.entries.get_mut(index)
    }

    /// Backing-store text: one `"<question_number>, <rubric_char>"` line per entry.
    pub fn to_records(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }
}
