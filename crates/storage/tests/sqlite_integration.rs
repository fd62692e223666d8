use chrono::{Duration, NaiveDate};
use genie_core::model::{
    Difficulty, GameResult, PlayerProfile, QuestionDraft, QuestionId, UserId, accuracy_percent,
};
use genie_core::time::fixed_now;
use storage::repository::{
    ProfileRepository, QuestionBank, QuestionSource, ResultRepository, Storage, StorageError,
};
use storage::sample::{SAMPLE_QUESTION_COUNT, sample_drafts};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn seed_samples(repo: &SqliteRepository) {
    for draft in sample_drafts() {
        repo.insert_question(&draft.validate().unwrap())
            .await
            .unwrap();
    }
}

fn result(score: u32, days_ago: i64) -> GameResult {
    GameResult::from_persisted(
        fixed_now() - Duration::days(days_ago),
        score,
        10,
        150,
        accuracy_percent(score, 10),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_question_bank_crud_roundtrip() {
    let repo = connect("memdb_questions").await;

    let draft = QuestionDraft {
        prompt: "Find the odd one out".into(),
        options: vec!["Maple".into(), "Oak".into(), "Pine".into(), "Bush".into()],
        correct_option: "Bush".into(),
        category: "Logical".into(),
        difficulty: Difficulty::Medium,
    };
    let id = repo
        .insert_question(&draft.validate().unwrap())
        .await
        .unwrap();

    let stored = repo.get_question(id).await.unwrap().expect("stored");
    assert_eq!(stored.options(), ["Maple", "Oak", "Pine", "Bush"]);
    assert_eq!(stored.category(), "logical");
    assert!(stored.is_correct("Bush"));

    let mut edit = stored.to_draft();
    edit.difficulty = Difficulty::Hard;
    let edited = genie_core::model::Question::from_persisted(id, edit).unwrap();
    repo.update_question(&edited).await.unwrap();
    assert_eq!(
        repo.get_question(id).await.unwrap().unwrap().difficulty(),
        Difficulty::Hard
    );

    repo.delete_question(id).await.unwrap();
    assert!(repo.get_question(id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_question(id).await,
        Err(StorageError::NotFound)
    ));
    assert!(matches!(
        repo.update_question(&edited).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_fetch_respects_limit_and_difficulty() {
    let repo = connect("memdb_fetch").await;
    seed_samples(&repo).await;

    let all = repo.list_questions().await.unwrap();
    assert_eq!(all.len(), SAMPLE_QUESTION_COUNT);
    assert_eq!(all[0].id(), QuestionId::new(1));

    let ten = repo.fetch_questions(10, &[]).await.unwrap();
    assert_eq!(ten.len(), 10);

    let hard = repo
        .fetch_questions(100, &[Difficulty::Hard])
        .await
        .unwrap();
    assert!(!hard.is_empty());
    assert!(hard.iter().all(|q| q.difficulty() == Difficulty::Hard));

    let easy_or_hard = repo
        .fetch_questions(100, &[Difficulty::Easy, Difficulty::Hard])
        .await
        .unwrap();
    let expected = all
        .iter()
        .filter(|q| q.difficulty() != Difficulty::Medium)
        .count();
    assert_eq!(easy_or_hard.len(), expected);
}

#[tokio::test]
async fn sqlite_results_are_listed_newest_first() {
    let repo = connect("memdb_results").await;
    let me = UserId::local();
    let other = UserId::random();

    repo.append_result(me, &result(4, 3)).await.unwrap();
    repo.append_result(me, &result(9, 0)).await.unwrap();
    repo.append_result(other, &result(10, 0)).await.unwrap();
    repo.append_result(me, &result(6, 1)).await.unwrap();

    let rows = repo.list_results(me, None, 10).await.unwrap();
    let scores: Vec<u32> = rows.iter().map(|r| r.result.score()).collect();
    assert_eq!(scores, vec![9, 6, 4]);
    assert!(rows.iter().all(|r| r.user_id == me));
    assert_eq!(rows[0].result.accuracy(), 90);

    let limited = repo.list_results(me, None, 2).await.unwrap();
    assert_eq!(limited.len(), 2);

    let recent = repo
        .list_results(me, Some(fixed_now() - Duration::days(2)), 10)
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
}

#[tokio::test]
async fn sqlite_profile_upsert_overwrites() {
    let repo = connect("memdb_profiles").await;
    let me = UserId::local();
    assert!(repo.get_profile(me).await.unwrap().is_none());

    let first = PlayerProfile::from_persisted(me, 300, 3, 2, NaiveDate::from_ymd_opt(2024, 2, 28))
        .unwrap();
    repo.upsert_profile(&first).await.unwrap();
    assert_eq!(repo.get_profile(me).await.unwrap(), Some(first));

    let second = PlayerProfile::from_persisted(me, 1000, 4, 3, NaiveDate::from_ymd_opt(2024, 2, 29))
        .unwrap();
    repo.upsert_profile(&second).await.unwrap();
    assert_eq!(repo.get_profile(me).await.unwrap(), Some(second));
}

#[tokio::test]
async fn storage_sqlite_builds_every_port() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let id = storage
        .question_bank
        .insert_question(&sample_drafts().remove(0).validate().unwrap())
        .await
        .unwrap();
    let fetched = storage.question_source.fetch_questions(5, &[]).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id(), id);
}
