pub mod application;
pub mod input;
pub mod view;
