pub mod admin_dto;
pub mod application_dto;
pub mod internship_dto;
pub mod profile_dto;
