pub mod classifier;
pub mod http;
pub mod quiz;

#[cfg(test)]
mod test_server;

pub use classifier::HttpClassifier;
pub use quiz::{Choice, Question, Quiz, QuizClient};
