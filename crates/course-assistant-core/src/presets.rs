/// Sample questions offered as one-click shortcuts
pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "What Python courses are available?",
    "Tell me about machine learning courses",
    "What are the most popular web development courses?",
    "Which courses are good for beginners?",
    "What advanced courses do you recommend for data scientists?",
];

pub const PRESET_COUNT: usize = SAMPLE_QUESTIONS.len();

/// The five preset questions for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presets {
    questions: Vec<String>,
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            questions: SAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl Presets {
    /// Use the configured questions when there are exactly five non-empty
    /// entries, otherwise the built-in ones.
    pub fn from_config(configured: Option<&[String]>) -> Self {
        match configured {
            Some(questions)
                if questions.len() == PRESET_COUNT
                    && questions.iter().all(|q| !q.trim().is_empty()) =>
            {
                Self {
                    questions: questions.to_vec(),
                }
            }
            Some(questions) => {
                tracing::warn!(
                    count = questions.len(),
                    "ignoring configured sample questions, expected {} non-empty entries",
                    PRESET_COUNT
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
