use std::path::Path;
use std::sync::Arc;

use edumentor::config::CounterMode;
use edumentor::infrastructure::MemoryStore;
use edumentor::models::community::{AuthorRef, NewAnswer, NewQuestion, QuestionFilter};
use edumentor::models::load_catalog;
use edumentor::models::progress::UserProgress;
use edumentor::services::{CommunityDataStore, Fetched};
use edumentor::workflow::{AnswerStatus, QuizRunner, QuizState};

fn asker() -> AuthorRef {
    AuthorRef::new("user-1", "أحمد", None)
}

fn question(title: &str) -> NewQuestion {
    NewQuestion {
        title: title.to_string(),
        content: "أحتاج إلى شرح مفصل مع أمثلة محلولة خطوة بخطوة.".to_string(),
        tags: NewQuestion::parse_tags("فيزياء, حركة"),
        subject: Some("العلوم الفيزيائية".to_string()),
        grade_level: Some("السنة الثانية ثانوي".to_string()),
        question_type: Some("سؤال عام".to_string()),
    }
}

fn answer(n: usize) -> NewAnswer {
    NewAnswer {
        content: format!("الإجابة رقم {}", n),
        author: AuthorRef::new(format!("user-{}", n + 10), "مجيب", None),
    }
}

async fn answers_count<S: edumentor::DocumentStore>(store: &CommunityDataStore<S>, qid: &str) -> u64 {
    store
        .get_question(qid)
        .await
        .unwrap()
        .map(|q| q.answers_count)
        .unwrap_or_default()
}

#[tokio::test]
async fn test_question_lifecycle() {
    let store = CommunityDataStore::new(MemoryStore::new(), CounterMode::AtomicIncrement);

    let qid = store
        .add_question(question("ما هو قانون نيوتن الثاني؟"), &asker())
        .await
        .unwrap();

    let questions = store.get_questions().await.into_items();
    assert_eq!(questions.len(), 1);
    let q = &questions[0];
    assert_eq!(q.id, qid);
    assert_eq!(q.title, "ما هو قانون نيوتن الثاني؟");
    assert_eq!((q.votes, q.answers_count, q.views), (0, 0, 0));
    assert_eq!(q.tags, vec!["فيزياء", "حركة"]);
    assert!(QuestionFilter::default().matches(q));

    for n in 0..3 {
        store.add_answer(&qid, answer(n)).await.unwrap();
        assert_eq!(answers_count(&store, &qid).await, n as u64 + 1);
    }

    let answers = store.get_answers(&qid).await.into_items();
    let contents: Vec<_> = answers.iter().map(|a| a.content.as_str()).collect();
    assert_eq!(contents, vec!["الإجابة رقم 0", "الإجابة رقم 1", "الإجابة رقم 2"]);
    assert!(answers.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn test_concurrent_answers_lose_update_with_read_then_write() {
    let memory = Arc::new(MemoryStore::new());
    let store = CommunityDataStore::new(Arc::clone(&memory), CounterMode::ReadThenWrite);
    let qid = store
        .add_question(question("كيف أحسب التسارع المتوسط؟"), &asker())
        .await
        .unwrap();

    let (a, b) = tokio::join!(store.add_answer(&qid, answer(1)), store.add_answer(&qid, answer(2)));
    a.unwrap();
    b.unwrap();

    // 两个回答都写入了，但计数只加了一次
    assert_eq!(store.get_answers(&qid).await.items().len(), 2);
    assert_eq!(answers_count(&store, &qid).await, 1);
}

#[tokio::test]
async fn test_concurrent_answers_with_atomic_increment() {
    let store = CommunityDataStore::new(MemoryStore::new(), CounterMode::AtomicIncrement);
    let qid = store
        .add_question(question("كيف أحسب التسارع المتوسط؟"), &asker())
        .await
        .unwrap();

    let results =
        futures::future::join_all((0..5).map(|n| store.add_answer(&qid, answer(n)))).await;
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(store.get_answers(&qid).await.items().len(), 5);
    assert_eq!(answers_count(&store, &qid).await, 5);
}

#[tokio::test]
async fn test_answer_for_missing_question_is_still_stored() {
    let store = CommunityDataStore::new(MemoryStore::new(), CounterMode::AtomicIncrement);

    let answer_id = store.add_answer("deleted-question", answer(1)).await.unwrap();

    let answers = store.get_answers("deleted-question").await.into_items();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].id, answer_id);
    assert!(store.get_question("deleted-question").await.unwrap().is_none());
}

#[tokio::test]
async fn test_backend_failures() {
    let memory = Arc::new(MemoryStore::new());
    let store = CommunityDataStore::new(Arc::clone(&memory), CounterMode::default());
    let qid = store
        .add_question(question("ما الفرق بين السرعة والتسارع؟"), &asker())
        .await
        .unwrap();

    memory.set_fail_reads(true);
    assert!(matches!(store.get_questions().await, Fetched::Failed(_)));
    assert!(store.get_answers(&qid).await.is_failed());
    // 读取父问题失败时不写入任何内容
    assert!(store.add_answer(&qid, answer(1)).await.unwrap_err().is_persistence());
    memory.set_fail_reads(false);

    memory.set_fail_writes(true);
    assert!(store.add_answer(&qid, answer(1)).await.unwrap_err().is_persistence());
    memory.set_fail_writes(false);

    assert!(matches!(store.get_answers(&qid).await, Fetched::Empty));
    assert_eq!(answers_count(&store, &qid).await, 0);
}

#[test]
fn test_bundled_algebra_quiz() {
    let catalog = tokio_test::block_on(load_catalog(
        &Path::new(env!("CARGO_MANIFEST_DIR")).join("data/catalog.toml"),
    ))
    .unwrap();
    let quiz = catalog.quiz("algebra-quiz-1").cloned().unwrap();
    assert_eq!(quiz.len(), 2);

    let mut runner = QuizRunner::new(quiz);
    runner.select_option("opt2").unwrap();
    assert_eq!(runner.submit_answer().unwrap(), AnswerStatus::Correct);
    runner.advance().unwrap();
    runner.select_option("opt1").unwrap();
    assert_eq!(runner.submit_answer().unwrap(), AnswerStatus::Incorrect);

    let state = runner.advance().unwrap();
    let QuizState::Completed(outcome) = state else {
        panic!("quiz should be completed, got {:?}", state);
    };
    assert_eq!((outcome.score, outcome.total_questions, outcome.percentage), (1, 2, 50));

    let mut progress = UserProgress::default();
    progress.record_score(runner.to_quiz_score("2024-05-01T10:00:00.000Z").unwrap());
    assert_eq!(progress.quiz_results_summary(), "Algebra Basics Quiz: 1/2 (50%)");
}
