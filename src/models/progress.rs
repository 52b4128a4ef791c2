use serde::{Deserialize, Serialize};

/// 一次测验的成绩
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
    pub quiz_id: String,
    pub quiz_title: String,
    /// 答对题数
    pub score: usize,
    pub total_questions: usize,
    pub percentage: u32,
    /// ISO-8601
    pub date: String,
}

/// 学习记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningRecord {
    pub module_id: String,
    pub module_title: String,
    /// ISO-8601
    pub completed_date: String,
    /// 例如 "45 minutes"
    pub time_spent: String,
}

/// 用户学习进度
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub completed_modules: Vec<String>,
    pub quiz_scores: Vec<QuizScore>,
    pub learning_history: Vec<LearningRecord>,
}

impl UserProgress {
    pub fn record_score(&mut self, score: QuizScore) {
        self.quiz_scores.push(score);
    }

    /// 标记模块完成，重复标记无效果
    pub fn complete_module(&mut self, record: LearningRecord) {
        if !self.completed_modules.contains(&record.module_id) {
            self.completed_modules.push(record.module_id.clone());
            self.learning_history.push(record);
        }
    }

    /// 某个测验的最好成绩
    pub fn best_score(&self, quiz_id: &str) -> Option<&QuizScore> {
        self.quiz_scores
            .iter()
            .filter(|s| s.quiz_id == quiz_id)
            .max_by_key(|s| s.percentage)
    }

    /// 所有测验的平均百分比，没有成绩时为 0
    pub fn average_percentage(&self) -> u32 {
        if self.quiz_scores.is_empty() {
            return 0;
        }
        let total: u32 = self.quiz_scores.iter().map(|s| s.percentage).sum();
        (total as f64 / self.quiz_scores.len() as f64).round() as u32
    }

    /// 推荐表单使用的学习历史摘要
    pub fn learning_history_summary(&self) -> String {
        self.learning_history
            .iter()
            .map(|r| format!("{} ({})", r.module_title, r.time_spent))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 推荐表单使用的测验成绩摘要
    pub fn quiz_results_summary(&self) -> String {
        self.quiz_scores
            .iter()
            .map(|s| format!("{}: {}/{} ({}%)", s.quiz_title, s.score, s.total_questions, s.percentage))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(quiz_id: &str, score: usize, total: usize, percentage: u32) -> QuizScore {
        QuizScore {
            quiz_id: quiz_id.to_string(),
            quiz_title: "Algebra Basics Quiz".to_string(),
            score,
            total_questions: total,
            percentage,
            date: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_scores_and_summaries() {
        let mut progress = UserProgress::default();
        assert_eq!(progress.average_percentage(), 0);

        progress.record_score(score("algebra-quiz-1", 1, 2, 50));
        progress.record_score(score("algebra-quiz-1", 2, 2, 100));
        assert_eq!(progress.best_score("algebra-quiz-1").map(|s| s.score), Some(2));
        assert_eq!(progress.average_percentage(), 75);
        assert_eq!(
            progress.quiz_results_summary(),
            "Algebra Basics Quiz: 1/2 (50%), Algebra Basics Quiz: 2/2 (100%)"
        );
    }

    #[test]
    fn test_complete_module_once() {
        let mut progress = UserProgress::default();
        let record = LearningRecord {
            module_id: "intro-to-algebra".to_string(),
            module_title: "Introduction to Algebra".to_string(),
            completed_date: "2024-01-01T00:00:00.000Z".to_string(),
            time_spent: "1 hour 45 minutes".to_string(),
        };
        progress.complete_module(record.clone());
        progress.complete_module(record);
        assert_eq!(progress.completed_modules.len(), 1);
        assert_eq!(progress.learning_history_summary(), "Introduction to Algebra (1 hour 45 minutes)");
    }
}
