use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::types::{ChatMessage, UserRecord};

/// Analytics derived from a user's stored history.
#[derive(Debug, Serialize)]
pub struct ConversationStats {
    pub user_id: String,
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    /// One score per message in history order: `1` if it mentions "happy", else `-1`.
    pub mood_trend: Vec<i8>,
    pub sentiment: SentimentCounts,
    /// Most frequent words, highest count first.
    pub top_words: Vec<WordCount>,
    /// Occurrences of each classifier label.
    pub emotions: BTreeMap<String, usize>,
    pub important_info: Vec<String>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Compute [`ConversationStats`] for `record`, keeping `top_n` words.
pub fn conversation_stats(record: &UserRecord, top_n: usize) -> ConversationStats {
    let history = &record.chat_history;
    let user_messages = history
        .iter()
        .filter(|m| m.role == super::types::Role::User)
        .count();

    let mut emotions = BTreeMap::new();
    for label in history.iter().filter_map(|m| m.emotion.as_deref()) {
        *emotions.entry(label.to_string()).or_insert(0) += 1;
    }

    ConversationStats {
        user_id: record.user_id.clone(),
        total_messages: history.len(),
        user_messages,
        assistant_messages: history.len() - user_messages,
        mood_trend: history.iter().map(mood_score).collect(),
        sentiment: sentiment_counts(history),
        top_words: word_frequency(history, top_n),
        emotions,
        important_info: record.important_info.clone(),
    }
}

fn mood_score(message: &ChatMessage) -> i8 {
    if message.content.to_lowercase().contains("happy") {
        1
    } else {
        -1
    }
}

pub fn sentiment_counts(history: &[ChatMessage]) -> SentimentCounts {
    let mut counts = SentimentCounts::default();
    for message in history {
        let text = message.content.to_lowercase();
        // A message mentioning both counts once on each side.
        let happy = text.contains("happy");
        let sad = text.contains("sad");
        if happy {
            counts.positive += 1;
        }
        if sad {
            counts.negative += 1;
        }
        if !happy && !sad {
            counts.neutral += 1;
        }
    }
    counts
}

/// Lowercased alphabetic words of three or more letters, ties broken alphabetically.
pub fn word_frequency(history: &[ChatMessage], top_n: usize) -> Vec<WordCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for message in history {
        for word in message
            .content
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| w.chars().count() >= 3)
        {
            *counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(top_n);
    ranked
}
