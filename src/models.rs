pub mod element;
pub mod job;
pub mod project;
pub mod view;
pub mod workflow;
