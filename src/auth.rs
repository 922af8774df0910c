pub mod command;
pub mod controller;
pub mod domain;
pub mod extractor;
pub mod factory;
