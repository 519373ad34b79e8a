mod error;
mod handlers;
mod middleware;
mod routes;

pub use error::AppError;
pub use handlers::RequestBody;
pub use middleware::{Caller, extract_bearer_token};
pub use routes::{
    ApiState, Directory, directory_routes, organization_routes, team_routes, user_routes,
};
