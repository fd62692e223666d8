//! Plain-text rendering for the terminal front end.

use std::fmt::Write as _;

use genie_core::feedback::{AccuracyBand, accuracy_feedback};
use genie_core::model::{GameResult, Question};
use genie_core::progression::ProgressOutcome;
use genie_core::time::local_date;
use services::{Completion, GameProgress, Persistence, StatsOverview, StreakWeek};
use storage::repository::GameResultRow;

const OPTION_LABELS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `45s` under a minute, `2m 5s` from there on.
#[must_use]
pub fn format_time(secs: u32) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn option_label(index: usize) -> char {
    OPTION_LABELS.chars().nth(index).unwrap_or('?')
}

/// Map typed input to one of the question's options.
///
/// Option text wins (exact first, then ignoring case), then a letter label
/// (`a`, `B`), then a 1-based number. Anything else is passed through as
/// typed and will be graded wrong.
#[must_use]
pub fn resolve_choice(question: &Question, input: &str) -> String {
    let input = input.trim();
    let options = question.options();
    if let Some(option) = options.iter().find(|o| o.as_str() == input) {
        return option.clone();
    }
    let folded = input.to_lowercase();
    if let Some(option) = options.iter().find(|o| o.to_lowercase() == folded) {
        return option.clone();
    }

    let mut chars = input.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        let upper = letter.to_ascii_uppercase();
        if let Some(index) = OPTION_LABELS.find(upper)
            && let Some(option) = options.get(index)
        {
            return option.clone();
        }
    }

    if let Ok(number) = input.parse::<usize>()
        && let Some(option) = number.checked_sub(1).and_then(|i| options.get(i))
    {
        return option.clone();
    }

    input.to_string()
}

#[must_use]
pub fn question_block(question: &Question, progress: &GameProgress, time_limit: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nQuestion {} of {}  [{} | {}]  {}s",
        progress.answered + 1,
        progress.total,
        question.category(),
        question.difficulty(),
        time_limit
    );
    let _ = writeln!(out, "{}", question.prompt());
    for (index, option) in question.options().iter().enumerate() {
        let _ = writeln!(out, "  {}) {option}", option_label(index));
    }
    out
}

#[must_use]
pub fn band_label(band: AccuracyBand) -> &'static str {
    match band {
        AccuracyBand::High => "high",
        AccuracyBand::Medium => "medium",
        AccuracyBand::Low => "low",
    }
}

#[must_use]
pub fn result_card(completion: &Completion) -> String {
    let result = &completion.result;
    let mut out = String::new();
    let _ = writeln!(out, "\n=== Round complete ===");
    let _ = writeln!(
        out,
        "Score: {}/{}  Accuracy: {}% ({})",
        result.score(),
        result.total_questions(),
        result.accuracy(),
        band_label(AccuracyBand::from_accuracy(result.accuracy()))
    );
    let _ = writeln!(out, "Time: {}", format_time(result.time_taken_secs()));
    let _ = writeln!(out, "{}", accuracy_feedback(result.accuracy()));

    match &completion.persistence {
        Persistence::Saved { progress, .. } => match progress.outcome {
            ProgressOutcome::Updated => {
                let _ = writeln!(
                    out,
                    "+{} points ({} total)  Level {}  Streak {} day(s)",
                    progress.points_awarded,
                    progress.after.points(),
                    progress.after.level(),
                    progress.after.streak_days()
                );
                if progress.leveled_up() {
                    let _ = writeln!(out, "Level up! You reached level {}.", progress.after.level());
                }
            }
            ProgressOutcome::AlreadyPlayedToday => {
                let _ = writeln!(
                    out,
                    "Already played today: points and streak unchanged (level {}, streak {} day(s))",
                    progress.after.level(),
                    progress.after.streak_days()
                );
            }
        },
        Persistence::Failed { error } => {
            let _ = writeln!(out, "Result could not be saved: {error}");
        }
    }
    out
}

#[must_use]
pub fn history_line(row: &GameResultRow) -> String {
    let result: &GameResult = &row.result;
    format!(
        "{}  {:>3}/{:<3} {:>3}%  {}",
        local_date(result.completed_at()),
        result.score(),
        result.total_questions(),
        result.accuracy(),
        format_time(result.time_taken_secs())
    )
}

#[must_use]
pub fn overview_block(overview: &StatsOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Games played:     {}", overview.games_played);
    let _ = writeln!(out, "Average accuracy: {}%", overview.average_accuracy);
    let _ = writeln!(
        out,
        "Correct answers:  {}/{}",
        overview.total_correct, overview.total_questions
    );
    let _ = writeln!(out, "Points:           {}", overview.points);
    let _ = writeln!(out, "Level:            {}", overview.level);
    let _ = writeln!(out, "Streak:           {} day(s)", overview.streak_days);
    out
}

#[must_use]
pub fn week_block(week: &StreakWeek) -> String {
    let mut header = String::new();
    let mut marks = String::new();
    for day in &week.days {
        let name = day.date.format("%a").to_string();
        let _ = write!(header, "{name:<5}");
        let mark = match (day.played, day.is_today) {
            (true, _) => "[x]",
            (false, true) => "[ ]",
            (false, false) => " . ",
        };
        let _ = write!(marks, "{mark:<5}");
    }
    format!(
        "{}\n{}\n{}\n",
        header.trim_end(),
        marks.trim_end(),
        week.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use genie_core::model::{Difficulty, QuestionDraft, QuestionId};

    fn question(options: &[&str], correct: &str) -> Question {
        Question::from_persisted(
            QuestionId::new(1),
            QuestionDraft {
                prompt: "Pick one".into(),
                options: options.iter().map(|o| (*o).to_string()).collect(),
                correct_option: correct.into(),
                category: "logic".into(),
                difficulty: Difficulty::Easy,
            },
        )
        .unwrap()
    }

    #[test]
    fn format_time_switches_to_minutes_at_sixty() {
        assert_eq!(format_time(0), "0s");
        assert_eq!(format_time(59), "59s");
        assert_eq!(format_time(60), "1m 0s");
        assert_eq!(format_time(185), "3m 5s");
    }

    #[test]
    fn resolve_choice_prefers_exact_text_then_letter_then_number() {
        let q = question(&["7", "8", "9", "10"], "8");
        assert_eq!(resolve_choice(&q, "10"), "10");
        assert_eq!(resolve_choice(&q, "b"), "8");
        assert_eq!(resolve_choice(&q, "1"), "7");

        let q = question(&["Paris", "Rome"], "Rome");
        assert_eq!(resolve_choice(&q, " B "), "Rome");
        assert_eq!(resolve_choice(&q, "2"), "Rome");
        assert_eq!(resolve_choice(&q, "Z"), "Z");
        assert_eq!(resolve_choice(&q, "Madrid"), "Madrid");
        assert_eq!(resolve_choice(&q, "rome"), "Rome");
    }

    #[test]
    fn lowercase_text_beats_letter_label() {
        let q = question(&["E", "N", "T", "X"], "T");
        assert_eq!(resolve_choice(&q, "t"), "T");
        assert_eq!(resolve_choice(&q, "x"), "X");
        assert_eq!(resolve_choice(&q, "a"), "E");
        assert_eq!(resolve_choice(&q, "B"), "N");
    }

    #[test]
    fn question_block_labels_options() {
        let q = question(&["Paris", "Rome"], "Rome");
        let progress = GameProgress {
            total: 10,
            answered: 2,
            correct: 1,
            remaining: 8,
            is_complete: false,
        };
        let text = question_block(&q, &progress, 30);
        assert!(text.contains("Question 3 of 10"));
        assert!(text.contains("A) Paris"));
        assert!(text.contains("B) Rome"));
    }
}
