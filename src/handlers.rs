pub mod jobs;
pub mod projects;
pub mod views;
