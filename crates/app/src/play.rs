//! Interactive timed round on the terminal.

use std::error::Error;
use std::time::Duration;

use genie_core::model::UserId;
use services::{
    Completion, Countdown, GameLoopService, GamePhase, GameSession, TickOutcome, TimerToken,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::format::{question_block, resolve_choice, result_card};

const QUIT: &str = ":q";

/// Announce the remaining time only at these marks.
fn should_announce(remaining_secs: u32) -> bool {
    remaining_secs <= 5 || remaining_secs % 10 == 0
}

fn show_question(session: &GameSession, countdown: &mut Countdown, token: TimerToken) {
    if let Some(question) = session.current_question() {
        print!(
            "{}",
            question_block(question, &session.progress(), session.time_limit_secs())
        );
        countdown.start(token, session.time_limit_secs());
    }
}

fn current_answer(session: &GameSession) -> Option<String> {
    session
        .current_question()
        .map(|q| q.correct_option().to_string())
}

/// Play one round for `user_id`, reading answers from stdin.
///
/// Returns `Ok(None)` if the player quits or stdin closes before the round
/// completes; nothing is saved in that case.
pub async fn play(
    game_loop: &GameLoopService,
    user_id: UserId,
) -> Result<Option<Completion>, Box<dyn Error>> {
    let feedback_delay = Duration::from_millis(game_loop.settings().feedback_delay_ms());
    let mut session = game_loop.start_game(user_id).await?;
    let (mut countdown, mut ticks) = Countdown::channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Answer with the option letter, number or text. Type {QUIT} to quit.");
    if let Some(token) = session.timer_token() {
        show_question(&session, &mut countdown, token);
    }

    let completion = loop {
        tokio::select! {
            Some(token) = ticks.recv() => {
                let answer = current_answer(&session);
                let report = game_loop.tick(&mut session, token).await?;
                match report.outcome {
                    TickOutcome::Ignored => continue,
                    TickOutcome::Counting { remaining_secs } => {
                        if should_announce(remaining_secs) {
                            println!("  {remaining_secs}s left");
                        }
                        continue;
                    }
                    TickOutcome::Expired(_) => {
                        println!("Time's up! The answer was: {}", answer.unwrap_or_default());
                    }
                }
                if let Some(completion) = report.completion {
                    break Some(completion);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break None;
                };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input == QUIT {
                    break None;
                }
                if session.phase() != GamePhase::Active {
                    continue;
                }
                let Some(question) = session.current_question() else {
                    continue;
                };
                let choice = resolve_choice(question, input);
                let answer = question.correct_option().to_string();

                countdown.cancel();
                let outcome = game_loop.submit_answer(&mut session, &choice).await?;
                if outcome.submission.was_correct() {
                    println!("Correct!");
                } else {
                    println!("Wrong. The answer was: {answer}");
                }
                if let Some(completion) = outcome.completion {
                    break Some(completion);
                }
            }
        }

        tokio::time::sleep(feedback_delay).await;
        let token = game_loop.advance(&mut session)?;
        show_question(&session, &mut countdown, token);
    };

    countdown.cancel();
    match &completion {
        Some(completion) => print!("{}", result_card(completion)),
        None => {
            game_loop.reset(&mut session);
            println!("Round abandoned. Nothing was saved.");
        }
    }
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announces_every_ten_seconds_and_the_last_five() {
        let marks: Vec<u32> = (0..=30).rev().filter(|s| should_announce(*s)).collect();
        assert_eq!(marks, vec![30, 20, 10, 5, 4, 3, 2, 1, 0]);
    }
}
