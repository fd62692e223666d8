use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use genie_core::model::{Difficulty, GameResult, GameSettings, PlayerProfile, Question, UserId};
use genie_core::time::fixed_now;
use services::{
    Clock, Countdown, GameLoopService, GamePhase, Persistence, SessionError, TickOutcome,
};
use storage::repository::{
    GameResultId, GameResultRow, InMemoryRepository, ProfileRepository, QuestionSource,
    ResultRepository, StorageError,
};
use storage::sample::sample_questions;

struct UnavailableSource;

#[async_trait::async_trait]
impl QuestionSource for UnavailableSource {
    async fn fetch_questions(
        &self,
        _limit: u32,
        _difficulties: &[Difficulty],
    ) -> Result<Vec<Question>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

/// Result store whose writes always fail, counting attempts.
#[derive(Default)]
struct FailingResults {
    attempts: AtomicUsize,
}

#[async_trait::async_trait]
impl ResultRepository for FailingResults {
    async fn append_result(
        &self,
        _user_id: UserId,
        _result: &GameResult,
    ) -> Result<GameResultId, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Connection("write refused".into()))
    }

    async fn list_results(
        &self,
        _user_id: UserId,
        _completed_from: Option<DateTime<Utc>>,
        _limit: u32,
    ) -> Result<Vec<GameResultRow>, StorageError> {
        Ok(Vec::new())
    }
}

fn seeded_repo() -> InMemoryRepository {
    InMemoryRepository::with_questions(sample_questions().unwrap())
}

fn loop_service(repo: &InMemoryRepository) -> GameLoopService {
    GameLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

#[tokio::test]
async fn pool_of_25_yields_10_unique_questions() {
    let repo = seeded_repo();
    let svc = loop_service(&repo);

    for _ in 0..5 {
        let session = svc.start_game(UserId::local()).await.unwrap();
        let ids: HashSet<_> = session.questions().iter().map(Question::id).collect();
        assert_eq!(session.questions().len(), 10);
        assert_eq!(ids.len(), 10);
        assert_eq!(session.index(), 0);
        assert_eq!(session.remaining_secs(), 30);
    }
}

#[tokio::test]
async fn difficulty_filter_limits_the_pool() {
    let repo = seeded_repo();
    let settings = GameSettings::new(5, 20, 0, 100, vec![Difficulty::Hard]).unwrap();
    let svc = loop_service(&repo).with_settings(settings);

    let session = svc.start_game(UserId::local()).await.unwrap();
    assert!(!session.questions().is_empty());
    assert!(session.questions().len() <= 5);
    assert!(
        session
            .questions()
            .iter()
            .all(|q| q.difficulty() == Difficulty::Hard)
    );
    assert_eq!(session.time_limit_secs(), 20);
}

#[tokio::test]
async fn fetch_failure_creates_no_session() {
    let repo = InMemoryRepository::new();
    let svc = GameLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(UnavailableSource),
        Arc::new(repo.clone()),
        Arc::new(repo),
    );

    let err = svc.start_game(UserId::local()).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Fetch(StorageError::Connection(_))
    ));
}

#[tokio::test]
async fn persistence_failure_still_reports_result_once() {
    let repo = seeded_repo();
    let failing = Arc::new(FailingResults::default());
    let svc = GameLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::clone(&failing) as Arc<dyn ResultRepository>,
        Arc::new(repo.clone()),
    )
    .with_settings(GameSettings::new(2, 30, 0, 100, Vec::new()).unwrap());

    let user = UserId::local();
    let mut session = svc.start_game(user).await.unwrap();

    let first = session.current_question().unwrap().correct_option().to_string();
    svc.submit_answer(&mut session, &first).await.unwrap();
    svc.advance(&mut session).unwrap();
    let outcome = svc.submit_answer(&mut session, "not an option").await.unwrap();

    let completion = outcome.completion.expect("completed");
    assert_eq!(completion.result.score(), 1);
    assert_eq!(completion.result.accuracy(), 50);
    assert!(matches!(
        completion.persistence,
        Persistence::Failed {
            error: StorageError::Connection(_)
        }
    ));
    assert_eq!(session.phase(), GamePhase::Complete);
    assert_eq!(session.result(), Some(&completion.result));

    // Neither a duplicate submission nor an explicit finalize writes again.
    let again = svc.submit_answer(&mut session, "x").await.unwrap();
    assert!(again.submission.is_duplicate());
    assert!(again.completion.is_none());
    assert!(matches!(
        svc.finalize(&mut session).await,
        Err(SessionError::AlreadyFinalized)
    ));
    assert_eq!(failing.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(repo.get_profile(user).await.unwrap(), None::<PlayerProfile>);
}

#[tokio::test(start_paused = true)]
async fn countdown_expires_unanswered_question() {
    let repo = seeded_repo();
    let svc = loop_service(&repo)
        .with_settings(GameSettings::new(2, 5, 0, 100, Vec::new()).unwrap());
    let mut session = svc.start_game(UserId::local()).await.unwrap();

    let (mut countdown, mut ticks) = Countdown::channel();
    let token = session.timer_token().unwrap();
    countdown.start(token, session.time_limit_secs());

    let mut expired = None;
    while let Some(token) = ticks.recv().await {
        let report = svc.tick(&mut session, token).await.unwrap();
        if let TickOutcome::Expired(submission) = report.outcome {
            expired = Some(submission);
            break;
        }
    }

    let submission = expired.expect("question expired");
    assert!(!submission.was_correct());
    assert_eq!(submission.record().elapsed_secs, 5);
    assert_eq!(session.phase(), GamePhase::AwaitingAdvance);
}

#[tokio::test(start_paused = true)]
async fn tick_queued_before_submission_cannot_expire_next_question() {
    let repo = seeded_repo();
    let svc = loop_service(&repo)
        .with_settings(GameSettings::new(2, 5, 0, 100, Vec::new()).unwrap());
    let mut session = svc.start_game(UserId::local()).await.unwrap();

    let (mut countdown, mut ticks) = Countdown::channel();
    let first_token = session.timer_token().unwrap();
    countdown.start(first_token, session.time_limit_secs());

    // Let every tick of the first run land in the channel unprocessed.
    tokio::time::sleep(Duration::from_secs(6)).await;

    let correct = session.current_question().unwrap().correct_option().to_string();
    countdown.cancel();
    let outcome = svc.submit_answer(&mut session, &correct).await.unwrap();
    assert!(outcome.submission.was_correct());

    let next = svc.advance(&mut session).unwrap();
    countdown.start(next, session.time_limit_secs());

    // Drain the stale ticks: all ignored.
    for _ in 0..5 {
        let stale = ticks.recv().await.unwrap();
        assert_eq!(stale, first_token);
        let report = svc.tick(&mut session, stale).await.unwrap();
        assert_eq!(report.outcome, TickOutcome::Ignored);
    }
    assert_eq!(session.phase(), GamePhase::Active);
    assert_eq!(session.remaining_secs(), 5);
    assert_eq!(session.answers().len(), 1);
}
