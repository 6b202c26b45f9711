//! Quiz content service client (`GET /dataapi/quizzes/{id}`).
//!
//! The monitor never owns quiz content; this client exists so a session
//! driver can show what is being examined.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vigil_core::ServiceConfig;

use crate::http::{build_client, endpoint, ResponseExt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: u64,
    pub choice_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub question_text: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

pub struct QuizClient {
    client: Client,
    base_url: String,
}

impl QuizClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: api_url.to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(&config.api_url, config.request_timeout())
    }

    /// Fetch a quiz with its questions and choices
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the service answers with a
    /// non-success status, or the body is not a quiz.
    pub async fn fetch_quiz(&self, quiz_id: u64) -> Result<Quiz> {
        let url = endpoint(&self.base_url, &format!("/dataapi/quizzes/{quiz_id}"));

        let quiz: Quiz = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch quiz")?
            .ensure_success("Quiz")
            .await?
            .json()
            .await
            .context("Failed to parse quiz")?;

        log::info!(
            "Fetched quiz {} '{}' ({} questions)",
            quiz.id,
            quiz.title,
            quiz.question_count()
        );
        Ok(quiz)
    }
}
