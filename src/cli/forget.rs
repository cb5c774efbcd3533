//! CLI `forget` command: delete everything stored for one user after confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use calm::config::CalmConfig;
use calm::profile::normalize_user_id;
use calm::profile::store;

/// Delete a user's record after confirmation. `yes` skips the prompt.
pub fn forget(config: &CalmConfig, user_id: &str, yes: bool) -> Result<()> {
    let user_id = normalize_user_id(user_id)?;

    if !yes {
        println!("WARNING: This will permanently delete the profile, chat history, and keywords of '{user_id}'.");
        println!("Database: {}", config.resolved_db_path().display());
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != "YES" {
            bail!("forget cancelled");
        }
    }

    let conn = super::open_db(config)?;
    if store::delete_user(&conn, user_id)? {
        println!("All data for '{user_id}' deleted.");
    } else {
        println!("No record found for '{user_id}'.");
    }
    Ok(())
}
