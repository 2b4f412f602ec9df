pub mod system;
pub mod todos;
