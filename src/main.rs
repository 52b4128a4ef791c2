use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use edumentor::infrastructure::document::to_iso8601;
use edumentor::models::{load_catalog, Quiz};
use edumentor::utils::logging;
use edumentor::workflow::{AnswerStatus, QuizRunner, QuizState};
use edumentor::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志（完整配置解析中的警告需要输出）
    logging::init(&Config::logging_from_env());

    // 加载配置
    let config = Config::from_env();

    let catalog = load_catalog(Path::new(&config.catalog_path))
        .await
        .with_context(|| format!("无法加载课程目录: {}", config.catalog_path))?;
    logging::log_startup(&config, catalog.modules.len(), catalog.quizzes.len());

    if catalog.quizzes.is_empty() {
        println!("لا توجد اختبارات متاحة.");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("الاختبارات المتاحة:");
    for (i, quiz) in catalog.quizzes.iter().enumerate() {
        println!("  {}. {} ({} أسئلة)", i + 1, quiz.title, quiz.len());
    }
    let choice = prompt(&mut lines, "اختر رقم الاختبار: ")?;
    let quiz = choice
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| catalog.quizzes.get(idx))
        .or_else(|| catalog.quiz(choice.trim()))
        .cloned()
        .context("اختيار غير صالح")?;

    run_quiz(quiz, &mut lines)
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, text: &str) -> Result<String> {
    print!("{}", text);
    io::stdout().flush()?;
    lines.next().context("انتهى الإدخال")?.map_err(Into::into)
}

fn run_quiz(quiz: Quiz, lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<()> {
    let mut runner = QuizRunner::new(quiz);

    loop {
        match runner.state() {
            QuizState::Completed(outcome) => {
                println!();
                println!(
                    "النتيجة: {}/{} ({}%)",
                    outcome.score, outcome.total_questions, outcome.percentage
                );
                for (i, item) in runner.review().iter().enumerate() {
                    let mark = if item.is_correct { "✓" } else { "✗" };
                    println!("{} {}. {}", mark, i + 1, item.prompt);
                    println!("    إجابتك: {}", item.selected_text.as_deref().unwrap_or("-"));
                    println!("    الإجابة الصحيحة: {}", item.correct_text.as_deref().unwrap_or("-"));
                    if let Some(explanation) = &item.explanation {
                        println!("    الشرح: {}", explanation);
                    }
                }
                if let Some(score) = runner.to_quiz_score(to_iso8601(&Utc::now())) {
                    tracing::info!("成绩已生成: {} {}%", score.quiz_id, score.percentage);
                }

                let again = prompt(lines, "إعادة الاختبار؟ (y/n): ")?;
                if again.trim().eq_ignore_ascii_case("y") {
                    runner.restart();
                    continue;
                }
                return Ok(());
            }
            QuizState::InProgress { question_index, status } => {
                if status != AnswerStatus::Unanswered {
                    runner.advance()?;
                    continue;
                }
                let Some(question) = runner.current_question().cloned() else {
                    // 没有题目
                    runner.advance()?;
                    continue;
                };

                println!();
                println!(
                    "السؤال {} من {} ({:.0}%)",
                    question_index + 1,
                    runner.quiz().len(),
                    runner.progress() * 100.0
                );
                println!("{}", question.text);
                for (i, option) in question.options.iter().enumerate() {
                    println!("  {}. {}", i + 1, option.text);
                }

                let input = prompt(lines, "إجابتك: ")?;
                let Some(option) = input
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| question.options.get(idx))
                else {
                    println!("اختيار غير صالح، حاول مرة أخرى.");
                    continue;
                };

                runner.select_option(&option.id)?;
                match runner.submit_answer()? {
                    AnswerStatus::Correct => println!("✓ إجابة صحيحة!"),
                    _ => println!(
                        "✗ إجابة خاطئة. الإجابة الصحيحة: {}",
                        question.correct_option().map(|o| o.text.as_str()).unwrap_or("-")
                    ),
                }
            }
        }
    }
}
