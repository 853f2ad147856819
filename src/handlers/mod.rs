pub mod form_handler;
pub mod options_handler;
