pub mod action;
pub mod address;
pub mod enums;
pub mod mail;
pub mod message;
