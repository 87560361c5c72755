pub mod diversity;
pub mod explanation;
pub mod feedback;
pub mod providers;
pub mod recommendations;
pub mod scoring;
pub mod taste_profile;

pub use recommendations::RecommendationService;
