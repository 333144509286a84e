use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rocket::fairing::AdHoc;
use rocket_sync_db_pools::{database, diesel};

use crate::orm::DbRunner;

pub const OFFLINE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("offline_migrations");

/// Pool for the local offline mirror. Kept separate from `DbConn` so logins
/// still work when the main database cannot be reached.
#[database("offline_db")]
pub struct OfflineDbConn(diesel::SqliteConnection);

impl DbRunner for OfflineDbConn {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        OfflineDbConn::run(self, f)
    }
}

pub fn run_offline_migrations(
    conn: &mut diesel::SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    conn.run_pending_migrations(OFFLINE_MIGRATIONS)?;
    Ok(())
}

pub fn run_offline_migrations_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Offline Store Migrations", |rocket| async {
        let Some(conn) = OfflineDbConn::get_one(&rocket).await else {
            error!("[offline] No connection available for the offline store");
            return Err(rocket);
        };
        match conn
            .run(|c| run_offline_migrations(c).map_err(|e| e.to_string()))
            .await
        {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("[offline] Failed to migrate the offline store: {}", e);
                Err(rocket)
            }
        }
    })
}
