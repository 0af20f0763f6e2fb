pub mod account;
pub mod application;
pub mod company;
pub mod evaluation;
pub mod internship;
pub mod student;
