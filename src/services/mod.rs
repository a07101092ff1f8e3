// 服务模块
// 提供核心业务逻辑服务

pub mod auth;
pub mod scoring;
pub mod storage;
pub mod store;

pub use auth::{hash_password, AuthManager};
pub use scoring::{award, evaluate, Evaluation, QuestionFeedback, POINTS_PER_CORRECT, UNANSWERED};
pub use storage::{StorageAdapter, AUTH_KEY, DB_KEY};
pub use store::{
    attempts_for_user, courses_owned_by, leaderboard, parse_options, AttemptReport, DomainStore, QuestionEdit,
};
