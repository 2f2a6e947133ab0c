//! Rule-based planning: pick a canned template by topic, size it by the
//! duration found in the description, and label the leading tasks by week.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_TASKS: usize = 12;
pub const SHORT_PLAN_TASKS: usize = 8;
pub const MAX_TASK_WORDS: usize = 10;

const OFFICE_KEYWORDS: &[&str] = &["excel", "word", "powerpoint", "office", "spreadsheet"];

const OFFICE_TEMPLATE: &[&str] = &[
    "Install the office suite and explore the main interface",
    "Learn Word basics: formatting text, styles and page layout",
    "Create a formatted document with headings, lists and tables",
    "Learn Excel basics: cells, rows, columns and simple formulas",
    "Practice SUM, AVERAGE, IF and VLOOKUP on sample data",
    "Build a monthly budget spreadsheet with charts",
    "Learn PowerPoint basics: slides, layouts and themes",
    "Create a short presentation with images and transitions",
    "Use pivot tables to summarise a dataset",
    "Learn keyboard shortcuts for Word, Excel and PowerPoint",
    "Combine Excel charts into a Word report",
    "Complete a final project using all three applications",
];

const STUDY_TEMPLATE: &[&str] = &[
    "Define the learning objective and what success looks like",
    "Collect study materials, courses and reference books",
    "Break the subject into weekly topics",
    "Schedule fixed daily study sessions in your calendar",
    "Study the fundamentals and take short notes",
    "Practice with exercises after every study session",
    "Review notes at the end of each week",
    "Work on a small hands-on project using what you learned",
    "Ask for feedback from a mentor or study group",
    "Take a practice test to find weak areas",
    "Revisit weak areas with focused practice",
    "Summarise what you learned and plan the next steps",
];

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(month|week|day)s?\b").expect("valid duration regex")
});

/// Canned task list matching the topic of the goal text
pub fn select_template(title: &str, description: &str) -> &'static [&'static str] {
    let text = format!("{} {}", title, description).to_lowercase();
    if OFFICE_KEYWORDS.iter().any(|k| text.contains(k)) {
        OFFICE_TEMPLATE
    } else {
        STUDY_TEMPLATE
    }
}

/// Weeks implied by the first "N month(s)", "N week(s)" or "N day(s)" phrase;
/// 0 when there is none
pub fn infer_duration_weeks(description: &str) -> u32 {
    let Some(caps) = DURATION_RE.captures(description) else {
        return 0;
    };
    let n: u32 = match caps[1].parse() {
        Ok(n) => n,
        Err(_) => return 0,
    };
    match caps[2].to_ascii_lowercase().as_str() {
        "month" => n.saturating_mul(4),
        "week" => n,
        _ => n.div_ceil(7),
    }
}

/// Keep at most `max_words` whitespace-separated words, marking a cut with
/// `...` on the last kept word
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    let mut kept = words[..max_words].join(" ");
    kept.push_str("...");
    kept
}

/// Build a task list for a goal from its title and description.
///
/// Blank input yields an empty plan.
pub fn plan_tasks(title: &str, description: &str) -> Vec<String> {
    if title.trim().is_empty() && description.trim().is_empty() {
        return Vec::new();
    }

    let template = select_template(title, description);
    let weeks = infer_duration_weeks(description) as usize;

    let cap = if (1..=4).contains(&weeks) {
        SHORT_PLAN_TASKS
    } else {
        MAX_TASKS.min(template.len())
    };
    let count = cap.min(template.len());
    let labelled = if weeks > 0 { weeks.min(count) } else { 0 };

    template[..count]
        .iter()
        .enumerate()
        .map(|(i, task)| {
            if i < labelled {
                format!("Week {}: {}", i + 1, task)
            } else {
                task.to_string()
            }
        })
        .map(|task| truncate_words(&task, MAX_TASK_WORDS))
        .filter(|task| !task.is_empty())
        .collect()
}
