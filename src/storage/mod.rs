mod preferences;
mod schema;
mod types;

pub use preferences::PreferenceStore;
pub use schema::Database;
pub use types::DatabaseError;
