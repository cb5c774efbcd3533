use anyhow::Result;

use calm::config::CalmConfig;
use calm::profile::normalize_user_id;
use calm::profile::stats::conversation_stats;
use calm::profile::store;

/// Display conversation analytics for a user in the terminal.
pub fn stats(config: &CalmConfig, user_id: &str) -> Result<()> {
    let user_id = normalize_user_id(user_id)?;
    let conn = super::open_db(config)?;

    let Some(record) = store::find_user(&conn, user_id)? else {
        println!("No record for '{user_id}'.");
        return Ok(());
    };
    let response = conversation_stats(&record, config.conversation.stats_top_words);

    println!("Conversation Statistics for {}", record.display_name());
    println!("{}", "=".repeat(40));
    println!("  Total messages:      {}", response.total_messages);
    println!("  From you:            {}", response.user_messages);
    println!("  From Calm Sphere:    {}", response.assistant_messages);
    println!();

    println!("Sentiment:");
    println!("  {:<12} {}", "positive", response.sentiment.positive);
    println!("  {:<12} {}", "negative", response.sentiment.negative);
    println!("  {:<12} {}", "neutral", response.sentiment.neutral);
    println!();

    let trend: String = response
        .mood_trend
        .iter()
        .map(|score| if *score > 0 { '+' } else { '-' })
        .collect();
    println!("Mood trend:            {}", if trend.is_empty() { "-" } else { trend.as_str() });
    println!();

    if !response.emotions.is_empty() {
        println!("Emotions:");
        for (label, count) in &response.emotions {
            println!("  {:<12} {}", label, count);
        }
        println!();
    }

    println!("Top words:");
    for wc in &response.top_words {
        println!("  {:<12} {}", wc.word, wc.count);
    }

    Ok(())
}
