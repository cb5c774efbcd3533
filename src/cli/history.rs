use anyhow::Result;

use calm::config::CalmConfig;
use calm::profile::normalize_user_id;
use calm::profile::store;
use calm::profile::types::Role;

/// Print a user's stored conversation, newest `limit` entries.
pub fn history(config: &CalmConfig, user_id: &str, limit: Option<usize>) -> Result<()> {
    let user_id = normalize_user_id(user_id)?;
    let conn = super::open_db(config)?;

    let Some(record) = store::find_user(&conn, user_id)? else {
        println!("No record for '{user_id}'.");
        return Ok(());
    };

    let history = &record.chat_history;
    let start = limit.map_or(0, |n| history.len().saturating_sub(n));

    println!(
        "History for {} ({} of {} messages)",
        record.display_name(),
        history.len() - start,
        history.len()
    );
    println!("{}", "=".repeat(40));

    for message in &history[start..] {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Calm Sphere",
            Role::System => "System",
        };
        match &message.emotion {
            Some(emotion) => println!("[{speaker}] ({emotion}) {}", message.content),
            None => println!("[{speaker}] {}", message.content),
        }
    }

    if !record.important_info.is_empty() {
        println!();
        println!("Remembered: {}", record.important_info.join(", "));
    }
    if record.incognito_mode {
        println!();
        println!("Incognito mode is ON; new messages are not being stored.");
    }

    Ok(())
}
