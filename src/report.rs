use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::aggregate;
use crate::models::{CityGroup, SignupRecord};
use crate::progress::{self, format_count, Goal, Progress};

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];
const BAR_WIDTH: usize = 20;

pub const EMPTY_LEADERBOARD: &str = "No cities yet. Be the first!";
const DISABLED: &str = "Disabled in configuration.";

fn rank_badge(index: usize) -> String {
    MEDALS
        .get(index)
        .map_or_else(|| format!("#{}", index + 1), |medal| (*medal).to_string())
}

pub fn render_leaderboard(groups: &[CityGroup]) -> String {
    if groups.is_empty() {
        return EMPTY_LEADERBOARD.to_string();
    }

    let mut output = String::new();
    for (index, group) in groups.iter().enumerate() {
        let _ = writeln!(
            output,
            "{} {}, {}: {}",
            rank_badge(index),
            group.city,
            group.country,
            format_count(group.count)
        );
    }
    output
}

pub fn progress_bar(percentage: u8) -> String {
    let filled = usize::from(percentage.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn render_progress(city: &str, progress: &Progress) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{city}: {} / {} signups",
        format_count(progress.count),
        format_count(progress.goal.get())
    );
    let _ = writeln!(
        output,
        "{} {}%",
        progress_bar(progress.percentage),
        progress.percentage
    );
    let _ = writeln!(output, "{}", progress.message());
    output
}

pub fn build_report(
    generated_at: DateTime<Utc>,
    total: u64,
    goal: Goal,
    cities: Option<&[CityGroup]>,
    leaderboard: Option<&[CityGroup]>,
    records: &[SignupRecord],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Waitlist Report");
    let _ = writeln!(
        output,
        "Generated {} with {} total signups (goal {} per city)",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        format_count(total),
        format_count(goal.get())
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");

    match leaderboard {
        None => {
            let _ = writeln!(output, "{DISABLED}");
        }
        Some([]) => {
            let _ = writeln!(output, "{EMPTY_LEADERBOARD}");
        }
        Some(leaderboard) => {
            for (index, group) in leaderboard.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "- {} {}, {}: {} signups",
                    rank_badge(index),
                    group.city,
                    group.country,
                    format_count(group.count)
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## City Progress");

    match cities {
        None => {
            let _ = writeln!(output, "{DISABLED}");
        }
        Some([]) => {
            let _ = writeln!(output, "No signups recorded yet.");
        }
        Some(cities) => {
            let _ = writeln!(output, "| City | Country | Signups | Progress | Tier | Status |");
            let _ = writeln!(output, "| --- | --- | ---: | ---: | --- | --- |");
            for group in cities {
                // Progress counts every signup in the city regardless of country.
                let count = aggregate::count_for_city(records, &group.city);
                let progress = progress::classify(count, goal);
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {}% | {} | {} |",
                    group.city,
                    group.country,
                    format_count(group.count),
                    progress.percentage,
                    progress.tier,
                    progress.message()
                );
            }
        }
    }

    let mut recent: Vec<&SignupRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Signups");

    if recent.is_empty() {
        let _ = writeln!(output, "No signups recorded yet.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) on {}",
                record.name,
                record.city,
                record.country_name,
                record.created_at.format("%Y-%m-%d")
            );
        }
    }

    output
}
