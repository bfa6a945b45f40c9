pub mod arg_aliases;
pub mod feature_flags;
pub mod paths;
pub mod suggest;
pub mod text;
pub mod tool_errors;
pub mod user_paths;
