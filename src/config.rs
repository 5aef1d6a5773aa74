use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_query_range_days: i64, // Upper bound on `end - start` for occurrence queries
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://sessions.db?mode=rwc".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            max_query_range_days: env::var("MAX_QUERY_RANGE_DAYS")
                .unwrap_or_else(|_| "731".to_string())
                .parse()
                .expect("MAX_QUERY_RANGE_DAYS must be a whole number of days"),
        }
    }
}
