//! Database repositories
//!
//! Repositories handle all direct database interactions.

pub mod contest_repo;
pub mod judge_node_repo;
pub mod problem_repo;
pub mod progress_repo;
pub mod submission_repo;

pub use contest_repo::ContestRepository;
pub use judge_node_repo::JudgeNodeRepository;
pub use problem_repo::ProblemRepository;
pub use progress_repo::ProgressRepository;
pub use submission_repo::SubmissionRepository;
