use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;

use crate::engine::{EnginePolicy, LatePolicy, MatchPolicy};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Attendance policy
    pub workday_start: NaiveTime,
    pub late_grace_minutes: i64,
    pub auto_checkout_time: NaiveTime,

    // Identity matching thresholds (empirical, keep tunable)
    pub match_min_score: f64,
    pub match_auto_accept_score: f64,

    // Rate limiting
    pub rate_ingest_per_min: u32,
    pub rate_admin_per_min: u32,
    pub rate_read_per_min: u32,

    pub api_prefix: String,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            workday_start: NaiveTime::parse_from_str(&env_or("WORKDAY_START", "10:30"), "%H:%M")
                .expect("WORKDAY_START must be HH:MM"),
            late_grace_minutes: env_or("LATE_GRACE_MINUTES", "15")
                .parse()
                .expect("LATE_GRACE_MINUTES must be a number"),
            auto_checkout_time: NaiveTime::parse_from_str(
                &env_or("AUTO_CHECKOUT_TIME", "17:00"),
                "%H:%M",
            )
            .expect("AUTO_CHECKOUT_TIME must be HH:MM"),

            match_min_score: env_or("MATCH_MIN_SCORE", "0.3")
                .parse()
                .expect("MATCH_MIN_SCORE must be a number"),
            match_auto_accept_score: env_or("MATCH_AUTO_ACCEPT_SCORE", "0.85")
                .parse()
                .expect("MATCH_AUTO_ACCEPT_SCORE must be a number"),

            rate_ingest_per_min: env_or("RATE_INGEST_PER_MIN", "60")
                .parse()
                .unwrap(),
            rate_admin_per_min: env_or("RATE_ADMIN_PER_MIN", "120")
                .parse()
                .unwrap(),
            rate_read_per_min: env_or("RATE_READ_PER_MIN", "1000")
                .parse()
                .unwrap(),

            api_prefix: env_or("API_PREFIX", "/api/v1"),
        }
    }

    pub fn engine_policy(&self) -> EnginePolicy {
        EnginePolicy {
            late: LatePolicy {
                workday_start: self.workday_start,
                grace_minutes: self.late_grace_minutes,
            },
            auto_checkout: self.auto_checkout_time,
            matching: MatchPolicy {
                min_score: self.match_min_score,
                auto_accept_score: self.match_auto_accept_score,
            },
        }
    }
}
