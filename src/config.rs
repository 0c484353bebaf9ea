use std::env;
use dotenvy::dotenv;
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Shift policy
    pub daily_shift_limit: i64,
    pub default_shift_hours: f64,
    pub auto_end_enabled: bool,

    // Rate limiting
    pub rate_api_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            daily_shift_limit: env::var("DAILY_SHIFT_LIMIT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap(),
            default_shift_hours: env::var("DEFAULT_SHIFT_HOURS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap(),
            auto_end_enabled: env::var("AUTO_END_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap(),

            rate_api_per_min: env::var("RATE_API_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }
}
