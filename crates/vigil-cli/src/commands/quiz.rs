use anyhow::Result;
use vigil_client::{Quiz, QuizClient};
use vigil_core::MonitorConfig;

pub async fn quiz_command(config: &MonitorConfig, quiz_id: u64) -> Result<()> {
    let client = QuizClient::from_config(&config.service)?;
    let quiz = client.fetch_quiz(quiz_id).await?;
    print_quiz(&quiz);
    Ok(())
}

/// Title line with question count
pub fn print_quiz_header(quiz: &Quiz) {
    println!("{} ({} questions)", quiz.title, quiz.question_count());
    if let Some(description) = quiz.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
}

fn print_quiz(quiz: &Quiz) {
    print_quiz_header(quiz);
    for (n, question) in quiz.questions.iter().enumerate() {
        println!("\n{}. {}", n + 1, question.question_text);
        for choice in &question.choices {
            println!("   ( ) {}", choice.choice_text);
        }
    }
}
