pub mod actuator;
pub mod users;
