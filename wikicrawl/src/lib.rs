pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use commands::command_argument_builder;
pub use handlers::{dump_options, expand_save_path, normalize_page_arg, path_options};
