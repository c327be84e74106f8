pub mod http;
mod task;
mod text;

pub use task::catch_task_panic;
pub use text::{display_width, sanitize_field, truncate_to_width};
