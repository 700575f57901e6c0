pub mod actuation;
pub mod command;
pub mod config;
pub mod gait;
pub mod input;
pub mod legs;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod supervisor;
