pub mod courses;
pub mod inventory;
pub mod jobs;
pub mod notifications;
pub mod parts;
pub mod vehicles;
