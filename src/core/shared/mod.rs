pub mod models;
pub mod schema;
pub mod state;
pub mod utils;

pub use models::{ApiResponse, Pagination, UserProfile};
pub use utils::{create_conn, with_conn, DbPool};
