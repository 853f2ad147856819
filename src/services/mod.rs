pub mod base_address;
pub mod form_controller;
pub mod generator_client;
pub mod notifier;
