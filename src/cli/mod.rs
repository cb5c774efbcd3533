pub mod chat;
pub mod doctor;
pub mod export;
pub mod forget;
pub mod history;
pub mod stats;

use anyhow::{Context, Result};
use rusqlite::Connection;

use calm::config::CalmConfig;
use calm::profile::normalize_user_id;
use calm::profile::store;
use calm::profile::types::ProfileUpdate;

/// Open the configured database for a one-shot command.
pub(crate) fn open_db(config: &CalmConfig) -> Result<Connection> {
    let db_path = config.resolved_db_path();
    calm::db::open_database(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}

/// Merge the given fields into a user's profile and print the result.
pub fn profile(config: &CalmConfig, user_id: &str, update: &ProfileUpdate) -> Result<()> {
    let user_id = normalize_user_id(user_id)?;
    let mut conn = open_db(config)?;

    store::update_profile(&mut conn, user_id, update)?;
    let record = store::get_or_create_user(&mut conn, user_id)?;

    println!("Profile for {}", record.user_id);
    println!("{}", "=".repeat(40));
    print_field("Name", record.name.as_deref());
    print_field("Age", record.age.map(|a| a.to_string()).as_deref());
    print_field("College", record.college.as_deref());
    print_field("Location", record.location.as_deref());
    print_field("Phone", record.phone.as_deref());
    print_field("Friends", record.friends.as_deref());
    println!(
        "  {:<10} {}",
        "Incognito",
        if record.incognito_mode { "ON" } else { "OFF" }
    );
    Ok(())
}

/// Flip incognito mode for a user.
pub fn incognito(config: &CalmConfig, user_id: &str) -> Result<()> {
    let user_id = normalize_user_id(user_id)?;
    let mut conn = open_db(config)?;
    let enabled = store::toggle_incognito(&mut conn, user_id)?;
    println!("{}", incognito_message(enabled));
    Ok(())
}

pub(crate) fn incognito_message(enabled: bool) -> String {
    format!("Incognito mode is now {}.", if enabled { "ON" } else { "OFF" })
}

fn print_field(label: &str, value: Option<&str>) {
    println!("  {:<10} {}", label, value.unwrap_or("-"));
}
