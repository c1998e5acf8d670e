pub mod json_path;
pub mod lang;
pub mod ui;
