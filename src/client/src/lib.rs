pub mod command;
pub mod config;
pub mod controller;
pub mod entrypoint;
pub mod history;
pub mod remote;
pub mod store;
pub mod view;
