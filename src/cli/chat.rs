//! CLI `chat` command: interactive conversation in the terminal.
//!
//! Logs the user in by username, offers a short registration for new users,
//! then reads one message per line. Lines starting with `/` are commands.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use calm::affirmations::daily_affirmation;
use calm::chat::ChatService;
use calm::config::CalmConfig;
use calm::profile::types::ProfileUpdate;

const HELP: &str = "Commands: /incognito  /history  /help  /quit";

pub async fn chat(config: CalmConfig, user_id: &str) -> Result<()> {
    let service = ChatService::from_config(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let login = service.login(user_id).await?;
    let user_id = login.record.user_id.clone();

    println!("Calm Sphere - your mental health friend");
    println!();
    if login.is_new {
        register(&service, &user_id, &mut lines).await?;
    } else {
        println!("Welcome back, {}!", login.record.display_name());
    }
    if login.record.incognito_mode {
        println!("Incognito mode is ON; this conversation will not be saved.");
    }
    println!("Today's affirmation: {}", daily_affirmation());
    println!("{HELP}");
    println!();

    loop {
        prompt("You> ").await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/incognito" => {
                let enabled = service.toggle_incognito(&user_id).await?;
                println!("{}", super::incognito_message(enabled));
            }
            "/history" => {
                for message in service.history(&user_id).await? {
                    println!("  [{}] {}", message.role, message.content);
                }
            }
            _ if line.starts_with('/') => println!("Unknown command. {HELP}"),
            message => {
                let reply = service.respond(&user_id, message).await?;
                println!("Calm Sphere> {}", reply.text);
            }
        }
    }

    println!("Take care. See you soon!");
    Ok(())
}

/// Collect optional profile details from a first-time user.
async fn register(
    service: &ChatService,
    user_id: &str,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    println!("Nice to meet you! Tell me a little about yourself (press enter to skip).");

    let name = ask("Your name: ", lines).await?;
    let age = ask("Your age: ", lines).await?;
    let college = ask("Your college: ", lines).await?;
    let location = ask("Your location: ", lines).await?;

    let update = ProfileUpdate {
        name,
        age: age.and_then(|a| a.parse().ok()),
        college,
        location,
        ..Default::default()
    };
    let record = service.update_profile(user_id, update).await?;
    println!("Welcome {}! Start chatting now.", record.display_name());
    Ok(())
}

async fn ask(question: &str, lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    prompt(question).await?;
    Ok(lines
        .next_line()
        .await?
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty()))
}

async fn prompt(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
