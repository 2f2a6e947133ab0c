//! Display text and colors for the two supported languages and themes.
//!
//! Nothing here reads global state: callers pass the [`UiSettings`] they
//! loaded, and get a [`Localizer`] or a [`ThemePalette`] back.

use shared::{Language, Theme, ThemePalette, UiSettings};

const EN: &[(&str, &str)] = &[
    ("dashboard_title", "🧠 Life Manager Dashboard"),
    ("welcome_message", "✨ Welcome {user}! Manage your life efficiently ✨"),
    ("pending_tasks", "Pending Tasks"),
    ("active_meds", "Active Meds"),
    ("active_goals", "Active Goals"),
    ("monthly_expense", "Monthly Expense"),
    ("task_management", "Task Management"),
    ("expense_tracker", "Expense Tracker"),
    ("goal_setting", "Goal Setting"),
    ("medication_reminder", "Medication Reminder"),
    ("settings_config", "Settings & Config"),
    ("footer_text", "💡 Manage your life efficiently with our integrated system"),
    ("settings_title", "🔧 Settings & Configuration"),
    ("current_user", "👤 Current User: {user}"),
    ("theme_selection", "🎨 Select Theme"),
    ("light_theme", "Light"),
    ("dark_theme", "Dark"),
    ("language_selection", "🌐 Select Language"),
    ("english", "English"),
    ("bengali", "Bengali"),
    ("save_settings", "💾 Save Settings"),
];

const BN: &[(&str, &str)] = &[
    ("dashboard_title", "🧠 লাইফ ম্যানেজার ড্যাশবোর্ড"),
    ("welcome_message", "✨ স্বাগতম {user}! আপনার জীবন দক্ষতার সাথে পরিচালনা করুন ✨"),
    ("pending_tasks", "অমীমাংসিত কাজ"),
    ("active_meds", "সক্রিয় ঔষধ"),
    ("active_goals", "সক্রিয় লক্ষ্য"),
    ("monthly_expense", "মাসিক খরচ"),
    ("task_management", "টাস্ক ম্যানেজমেন্ট"),
    ("expense_tracker", "খরচ ট্র্যাকার"),
    ("goal_setting", "লক্ষ্য নির্ধারণ"),
    ("medication_reminder", "ঔষধ অনুস্মারক"),
    ("settings_config", "সেটিংস এবং কনফিগারেশন"),
    ("footer_text", "💡 আমাদের সমন্বিত সিস্টেমের সাথে আপনার জীবন দক্ষতার সাথে পরিচালনা করুন"),
    ("settings_title", "🔧 সেটিংস এবং কনফিগারেশন"),
    ("current_user", "👤 বর্তমান ব্যবহারকারী: {user}"),
    ("theme_selection", "🎨 থিম নির্বাচন করুন"),
    ("light_theme", "লাইট"),
    ("dark_theme", "ডার্ক"),
    ("language_selection", "🌐 ভাষা নির্বাচন করুন"),
    ("english", "ইংরেজি"),
    ("bengali", "বাংলা"),
];

/// Keys of the feature cards shown on the dashboard, in display order
pub const DASHBOARD_CARDS: &[&str] = &[
    "task_management",
    "expense_tracker",
    "goal_setting",
    "medication_reminder",
    "settings_config",
];

fn table(language: Language) -> &'static [(&'static str, &'static str)] {
    match language {
        Language::En => EN,
        Language::Bn => BN,
    }
}

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    table(language)
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

#[derive(Debug, Clone, Copy)]
pub struct Localizer {
    language: Language,
}

impl Localizer {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn from_settings(settings: &UiSettings) -> Self {
        Self::new(settings.language)
    }

    /// Translated text for `key` with `{name}` placeholders filled from
    /// `args`. Missing keys fall back to English, then to the key itself.
    pub fn text(&self, key: &str, args: &[(&str, &str)]) -> String {
        let template = lookup(self.language, key)
            .or_else(|| lookup(Language::En, key))
            .unwrap_or(key);
        args.iter().fold(template.to_string(), |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }
}

/// Color table for `theme`
pub fn palette(theme: Theme) -> ThemePalette {
    let colors: [&str; 11] = match theme {
        Theme::Light => [
            "#f8f9fc", "#2c3e50", "#ffffff", "#2c3e50", "#ffffff", "#34495e", "#ecf0f1",
            "#ffffff", "#000000", "#3498db", "#ffffff",
        ],
        Theme::Dark => [
            "#2c3e50", "#ecf0f1", "#34495e", "#1a252f", "#ffffff", "#1a252f", "#ecf0f1",
            "#5d6d7e", "#ffffff", "#2980b9", "#ffffff",
        ],
    };
    let [bg, fg, card_bg, header_bg, header_fg, footer_bg, footer_fg, entry_bg, entry_fg, button_bg, button_fg] =
        colors.map(str::to_string);
    ThemePalette {
        bg,
        fg,
        card_bg,
        header_bg,
        header_fg,
        footer_bg,
        footer_fg,
        entry_bg,
        entry_fg,
        button_bg,
        button_fg,
    }
}
