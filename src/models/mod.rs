pub mod entity;
pub mod field;
pub mod notification;
pub mod relationship;
