pub mod actor;
pub mod actor_movie;
pub mod genre;
pub mod movie;
