pub mod catalog;
pub mod community;
pub mod loaders;
pub mod progress;
pub mod quiz;
pub mod subject;
pub mod user;

pub use catalog::{Catalog, ContentItem, Module};
pub use community::{AuthorRef, Answer, CommunityQuestion, NewAnswer, NewQuestion, QuestionFilter};
pub use loaders::{load_catalog, parse_catalog};
pub use progress::{LearningRecord, QuizScore, UserProgress};
pub use quiz::{QuestionOption, Quiz, QuizQuestion};
pub use subject::{Icon, Subject};
pub use user::{auth_error_message, AppUser, AuthIdentity, UserProfile};
