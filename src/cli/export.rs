use anyhow::Result;
use serde::Serialize;

use calm::config::CalmConfig;
use calm::profile::store;
use calm::profile::types::UserRecord;

/// Export format: wraps all exported user records.
#[derive(Debug, Serialize)]
struct ExportData {
    users: Vec<UserRecord>,
}

/// Export one user (or every user) as JSON to stdout.
pub fn export(config: &CalmConfig, user_id: Option<&str>) -> Result<()> {
    let conn = super::open_db(config)?;

    let ids = match user_id {
        Some(id) => vec![calm::profile::normalize_user_id(id)?.to_string()],
        None => store::list_users(&conn)?,
    };

    let mut users = Vec::with_capacity(ids.len());
    for id in &ids {
        match store::find_user(&conn, id)? {
            Some(record) => users.push(record),
            None => eprintln!("No record for '{id}', skipping."),
        }
    }

    let data = ExportData { users };
    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} user record(s).", data.users.len());
    Ok(())
}
