use crate::models::{Config, Error};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Pool, Postgres,
};
use std::str::FromStr;
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

pub async fn connect(config: &Config, instance_id: &str) -> Result<Pool<Postgres>, Error> {
    let conn = PgConnectOptions::from_str(config.database_url()?)?.application_name(instance_id);
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(conn)
        .await?;
    info!({ instance_id }, "connected to postgres");
    Ok(pool)
}

pub async fn migrate(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

pub async fn select_one(pool: &Pool<Postgres>) -> Result<(), Error> {
    _ = sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
