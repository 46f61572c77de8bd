pub mod app_config;
pub mod captain_repo;
pub mod database;
pub mod redis_repo;
pub mod ride_repo;
pub mod user_repo;

pub use app_config::Config;
pub use captain_repo::PgCaptainRepository;
pub use database::DbClient;
pub use redis_repo::RedisClient;
pub use ride_repo::PgRideRepository;
pub use user_repo::PgUserRepository;
