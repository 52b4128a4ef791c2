pub mod quiz_runner;

pub use quiz_runner::{
    AnswerStatus, QuestionReview, QuizActionError, QuizOutcome, QuizRunner, QuizState,
    RecordedAnswer,
};
