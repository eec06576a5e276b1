pub mod genre;
pub mod movie;
pub mod movie_genre;
pub mod seen_movie;
pub mod user;
pub mod user_preference;
