use std::io::BufRead;
use std::str::FromStr;

use services::{ActiveQuiz, DriverOutcome, QuizDriver, QuizEvent};
use tokio::sync::mpsc;
use trivia_core::model::OptionTag;
use trivia_core::session::AnswerKind;

/// Run `quiz` against stdin and stdout until it completes or stdin closes.
pub async fn run_in_terminal(
    driver: QuizDriver,
    quiz: ActiveQuiz,
) -> Result<DriverOutcome, Box<dyn std::error::Error>> {
    let (answer_tx, answer_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    spawn_stdin_reader(answer_tx);
    let driving = tokio::spawn(async move { driver.run(quiz, answer_rx, event_tx).await });

    while let Some(event) = event_rx.recv().await {
        render(&event);
    }

    Ok(driving.await??)
}

/// Blocking stdin reads live on a detached thread so they never hold up
/// runtime shutdown. End of input drops the sender, which abandons the quiz.
fn spawn_stdin_reader(answers: mpsc::Sender<OptionTag>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(error = %err, "stdin read failed");
                    return;
                }
            };
            match OptionTag::from_str(&line) {
                Ok(tag) => {
                    if answers.blocking_send(tag).is_err() {
                        return;
                    }
                }
                Err(err) => println!("{err}"),
            }
        }
    });
}

fn render(event: &QuizEvent) {
    match event {
        QuizEvent::QuestionShown {
            index,
            total,
            question,
            seconds,
        } => {
            println!();
            println!("Question {} of {total}  ({seconds}s)", index + 1);
            println!("{}", question.text());
            for (tag, text) in question.options() {
                println!("  {tag}) {text}");
            }
            println!("Your answer (a/b/c/d):");
        }
        QuizEvent::Tick { remaining } => {
            if *remaining <= 5 || remaining % 10 == 0 {
                println!("  {remaining}s left");
            }
        }
        QuizEvent::Answered(outcome) => match outcome.answer {
            AnswerKind::TimedOut => {
                println!("Time's up! The answer was {}.", outcome.correct_option);
            }
            AnswerKind::Selected(_) if outcome.is_correct => println!("Correct!"),
            AnswerKind::Selected(_) => {
                println!("Wrong. The answer was {}.", outcome.correct_option);
            }
        },
        QuizEvent::Completed { completion, saved } => {
            println!();
            println!(
                "Quiz complete: {} / {}",
                completion.score, completion.total_questions
            );
            if !saved {
                println!("(your score could not be saved)");
            }
        }
        QuizEvent::Abandoned => println!("Quiz abandoned; no score recorded."),
    }
}
