//! Request types and input validation

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length bounds for a question, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionLimits {
    /// Shortest accepted question
    pub min_chars: usize,
    /// Longest accepted question
    pub max_chars: usize,
}

impl QuestionLimits {
    /// Bounds enforced by the HTTP request DTO
    pub const TRANSPORT: QuestionLimits = QuestionLimits {
        min_chars: 10,
        max_chars: 250,
    };

    /// Create limits
    pub fn new(min_chars: usize, max_chars: usize) -> Self {
        Self {
            min_chars,
            max_chars,
        }
    }

    /// Validate a question against these bounds
    pub fn check(&self, question: &str) -> Result<()> {
        if question.trim().is_empty() {
            return Err(Error::validation("Missing text"));
        }

        let len = question.chars().count();
        if len > self.max_chars {
            return Err(Error::validation(format!(
                "Text too long ({} characters, maximum {})",
                len, self.max_chars
            )));
        }
        if len < self.min_chars {
            return Err(Error::validation(format!(
                "Text too short ({} characters, minimum {})",
                len, self.min_chars
            )));
        }

        Ok(())
    }
}

/// Query string of `GET /chat/ask-question`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// The question to answer
    #[serde(default)]
    pub question: String,
}

impl QuestionRequest {
    /// Create a request
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }

    /// DTO-level validation (10-250 characters)
    pub fn validate(&self) -> Result<()> {
        QuestionLimits::TRANSPORT.check(&self.question)
    }
}

/// Body of `POST /chat/load-pdf`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNameRequest {
    /// PDF file name, resolved against the documents directory
    #[serde(default)]
    pub file_name: String,
}

impl FileNameRequest {
    /// Create a request
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// DTO-level validation (1-100 characters)
    pub fn validate(&self) -> Result<()> {
        validate_file_name(&self.file_name, 100)
    }
}

/// Check that a file name is non-empty, bounded, and a bare name without path components
pub fn validate_file_name(file_name: &str, max_chars: usize) -> Result<()> {
    if file_name.trim().is_empty() {
        return Err(Error::validation("Missing file name"));
    }
    if file_name.chars().count() > max_chars {
        return Err(Error::validation(format!(
            "File name too long (maximum {} characters)",
            max_chars
        )));
    }
    if file_name.contains(|c: char| c == '/' || c == '\\') || file_name == "." || file_name == ".." {
        return Err(Error::validation(
            "File name must not contain path separators",
        ));
    }
    Ok(())
}
