//! 测验流程 - 流程层
//!
//! 核心职责：驱动用户逐题作答并计分
//!
//! 状态流转：
//! 1. InProgress(Unanswered) → select_option → submit_answer
//! 2. InProgress(Correct | Incorrect) → advance → 下一题或 Completed
//! 3. 任意状态 → restart → InProgress(0, Unanswered)
//!
//! 所有被拒绝的操作都不会改变状态。

use thiserror::Error;
use tracing::{debug, info};

use crate::models::progress::QuizScore;
use crate::models::quiz::{Quiz, QuizQuestion};

/// 当前题目的作答状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Unanswered,
    Correct,
    Incorrect,
}

/// 已提交的答案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAnswer {
    pub question_id: String,
    pub selected_option_id: String,
    pub is_correct: bool,
}

/// 测验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: usize,
    pub total_questions: usize,
    pub percentage: u32,
}

impl QuizOutcome {
    fn from_answers(answers: &[RecordedAnswer], total_questions: usize) -> Self {
        let score = answers.iter().filter(|a| a.is_correct).count();
        Self {
            score,
            total_questions,
            percentage: percentage(score, total_questions),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    InProgress {
        question_index: usize,
        status: AnswerStatus,
    },
    Completed(QuizOutcome),
}

/// 被拒绝的操作
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizActionError {
    #[error("测验已结束")]
    AlreadyCompleted,

    #[error("当前题目已提交")]
    AlreadyAnswered,

    #[error("当前题目尚未作答")]
    NotAnswered,

    #[error("尚未选择选项")]
    NoSelection,

    #[error("选项不存在: {option_id}")]
    UnknownOption { option_id: String },
}

/// 单题回顾（结果页）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionReview {
    pub question_id: String,
    pub prompt: String,
    pub selected_text: Option<String>,
    pub correct_text: Option<String>,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// 四舍五入的百分比，题目数为 0 时返回 0
pub fn percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * score as f64 / total as f64).round() as u32
}

/// 测验运行器
///
/// 单线程同步状态机，持有测验的只读副本。
#[derive(Debug, Clone)]
pub struct QuizRunner {
    quiz: Quiz,
    state: QuizState,
    answers: Vec<RecordedAnswer>,
    selected: Option<String>,
}

impl QuizRunner {
    pub fn new(quiz: Quiz) -> Self {
        info!("开始测验 {} ({} 题)", quiz.id, quiz.len());
        Self {
            quiz,
            state: Self::initial_state(),
            answers: Vec::new(),
            selected: None,
        }
    }

    fn initial_state() -> QuizState {
        QuizState::InProgress {
            question_index: 0,
            status: AnswerStatus::Unanswered,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.answers
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, QuizState::Completed(_))
    }

    pub fn outcome(&self) -> Option<QuizOutcome> {
        match self.state {
            QuizState::Completed(outcome) => Some(outcome),
            QuizState::InProgress { .. } => None,
        }
    }

    /// 当前题目，测验结束或没有题目时为 None
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.state {
            QuizState::InProgress { question_index, .. } => self.quiz.questions.get(question_index),
            QuizState::Completed(_) => None,
        }
    }

    /// 进度 0.0 ~ 1.0
    pub fn progress(&self) -> f64 {
        match self.state {
            QuizState::Completed(_) => 1.0,
            QuizState::InProgress { question_index, .. } => {
                if self.quiz.is_empty() {
                    0.0
                } else {
                    question_index as f64 / self.quiz.len() as f64
                }
            }
        }
    }

    fn unanswered_question(&self) -> Result<&QuizQuestion, QuizActionError> {
        match self.state {
            QuizState::Completed(_) => Err(QuizActionError::AlreadyCompleted),
            QuizState::InProgress { status, .. } if status != AnswerStatus::Unanswered => {
                Err(QuizActionError::AlreadyAnswered)
            }
            QuizState::InProgress { .. } => self
                .current_question()
                .ok_or(QuizActionError::AlreadyCompleted),
        }
    }

    /// 选择选项，可重复选择覆盖之前的选择
    pub fn select_option(&mut self, option_id: &str) -> Result<(), QuizActionError> {
        let question = self.unanswered_question()?;
        if question.option(option_id).is_none() {
            return Err(QuizActionError::UnknownOption {
                option_id: option_id.to_string(),
            });
        }
        self.selected = Some(option_id.to_string());
        Ok(())
    }

    /// 提交当前选择
    pub fn submit_answer(&mut self) -> Result<AnswerStatus, QuizActionError> {
        let question = self.unanswered_question()?;
        let selected = self.selected.clone().ok_or(QuizActionError::NoSelection)?;

        let is_correct = question.is_correct(&selected);
        let status = if is_correct {
            AnswerStatus::Correct
        } else {
            AnswerStatus::Incorrect
        };
        debug!("题目 {} 提交 {} -> {:?}", question.id, selected, status);

        self.answers.push(RecordedAnswer {
            question_id: question.id.clone(),
            selected_option_id: selected,
            is_correct,
        });
        if let QuizState::InProgress { question_index, .. } = self.state {
            self.state = QuizState::InProgress { question_index, status };
        }
        Ok(status)
    }

    /// 进入下一题，最后一题之后结束测验
    ///
    /// 没有题目的测验在初始状态即可直接结束，得分 0/0。
    pub fn advance(&mut self) -> Result<QuizState, QuizActionError> {
        let question_index = match self.state {
            QuizState::Completed(_) => return Err(QuizActionError::AlreadyCompleted),
            QuizState::InProgress { question_index, status } => {
                if status == AnswerStatus::Unanswered && !self.quiz.is_empty() {
                    return Err(QuizActionError::NotAnswered);
                }
                question_index
            }
        };

        self.selected = None;
        if question_index + 1 < self.quiz.len() {
            self.state = QuizState::InProgress {
                question_index: question_index + 1,
                status: AnswerStatus::Unanswered,
            };
        } else {
            let outcome = QuizOutcome::from_answers(&self.answers, self.quiz.len());
            info!(
                "测验 {} 完成: {}/{} ({}%)",
                self.quiz.id, outcome.score, outcome.total_questions, outcome.percentage
            );
            self.state = QuizState::Completed(outcome);
        }
        Ok(self.state)
    }

    pub fn restart(&mut self) {
        debug!("重新开始测验 {}", self.quiz.id);
        self.state = Self::initial_state();
        self.answers.clear();
        self.selected = None;
    }

    /// 每道题的作答回顾，未作答的题目 selected_text 为 None
    pub fn review(&self) -> Vec<QuestionReview> {
        self.quiz
            .questions
            .iter()
            .map(|q| {
                let answer = self.answers.iter().find(|a| a.question_id == q.id);
                QuestionReview {
                    question_id: q.id.clone(),
                    prompt: q.text.clone(),
                    selected_text: answer
                        .and_then(|a| q.option(&a.selected_option_id))
                        .map(|o| o.text.clone()),
                    correct_text: q.correct_option().map(|o| o.text.clone()),
                    is_correct: answer.is_some_and(|a| a.is_correct),
                    explanation: q.explanation.clone(),
                }
            })
            .collect()
    }

    /// 生成进度记录用的成绩，测验未结束时为 None
    pub fn to_quiz_score(&self, date: impl Into<String>) -> Option<QuizScore> {
        self.outcome().map(|outcome| QuizScore {
            quiz_id: self.quiz.id.clone(),
            quiz_title: self.quiz.title.clone(),
            score: outcome.score,
            total_questions: outcome.total_questions,
            percentage: outcome.percentage,
            date: date.into(),
        })
    }
}
