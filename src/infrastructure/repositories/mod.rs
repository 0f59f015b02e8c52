pub mod account_quota_store;
pub mod guest_history_store;
pub mod guest_quota_store;
pub mod history_repository;
pub mod ocr_space_repository;
pub mod openai_reply_repository;
pub mod tier_resolver;
pub mod user_repository;

pub use account_quota_store::AccountQuotaStore;
pub use guest_history_store::{GuestHistoryStore, GUEST_HISTORY_CAP};
pub use guest_quota_store::GuestQuotaStore;
pub use history_repository::HistoryRepository;
pub use ocr_space_repository::OcrSpaceRepository;
pub use openai_reply_repository::OpenAiReplyRepository;
pub use tier_resolver::CachedTierResolver;
pub use user_repository::UserRepository;
