pub mod actuator;
pub mod fallback;
pub mod users;
