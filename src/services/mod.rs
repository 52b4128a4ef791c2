pub mod community_store;
pub mod llm_service;
pub mod profile_service;
pub mod recommendation_service;

pub use community_store::{CommunityDataStore, Fetched};
pub use llm_service::{LlmService, TextGenerator};
pub use profile_service::ProfileService;
pub use recommendation_service::{
    parse_recommendation_response, ModuleList, Recommendation, RecommendationInput,
    RecommendationService,
};
