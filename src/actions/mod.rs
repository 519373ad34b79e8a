//! Multi-step operations shared by the HTTP layer and embedding code.

pub mod create_user;
pub mod issue_token;

pub use create_user::CreateUserAction;
pub use issue_token::IssueTokenAction;
