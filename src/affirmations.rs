use chrono::{Datelike, NaiveDate};

pub const AFFIRMATIONS: [&str; 5] = [
    "You are strong, capable, and resilient.",
    "You are worthy of love and happiness.",
    "Every day, you grow and become a better version of yourself.",
    "You have the power to overcome challenges.",
    "Your feelings are valid, and you deserve peace.",
];

/// Affirmation for `date`; the same all day, rotating day to day.
pub fn affirmation_for(date: NaiveDate) -> &'static str {
    let day = date.num_days_from_ce().rem_euclid(AFFIRMATIONS.len() as i32) as usize;
    AFFIRMATIONS[day]
}

/// Affirmation for the current local date.
pub fn daily_affirmation() -> &'static str {
    affirmation_for(chrono::Local::now().date_naive())
}
