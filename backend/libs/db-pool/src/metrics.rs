//! Pool gauges, refreshed by the reporter task spawned in `create_pool`

use prometheus::{register_int_gauge_vec, IntGaugeVec};
use sqlx::PgPool;

lazy_static::lazy_static! {
    static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "PostgreSQL pool connections by state (idle, in_use, max)",
        &["service", "state"]
    ).expect("failed to register db_pool_connections");
}

/// Point-in-time view of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: u32,
    pub in_use: u32,
    pub max: u32,
}

impl PoolStats {
    pub fn of(pool: &PgPool) -> Self {
        let size = pool.size();
        let idle = pool.num_idle() as u32;
        Self {
            idle,
            in_use: size.saturating_sub(idle),
            max: pool.options().get_max_connections(),
        }
    }
}

pub(crate) fn record(service: &str, stats: PoolStats) {
    for (state, value) in [
        ("idle", stats.idle),
        ("in_use", stats.in_use),
        ("max", stats.max),
    ] {
        DB_POOL_CONNECTIONS
            .with_label_values(&[service, state])
            .set(i64::from(value));
    }
}
