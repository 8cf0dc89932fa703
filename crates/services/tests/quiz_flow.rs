use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{
    AdvanceOutcome, PoolRecord, Session, SessionConfig, SessionPhase, TrueQuota,
};
use services::{QuizError, QuizStateMachine, ScoreBoard};
use storage::repository::{
    InMemoryRepository, SnapshotRepository, StatementSource, Storage, StorageError,
};

fn pool(trues: usize, falses: usize) -> Vec<PoolRecord> {
    (0..trues)
        .map(|i| PoolRecord::labeled(format!("t{i}"), format!("true {i}"), true))
        .chain((0..falses).map(|i| PoolRecord::labeled(format!("f{i}"), format!("false {i}"), false)))
        .collect()
}

/// Snapshot store that fails every operation.
struct BrokenSnapshots;

#[async_trait]
impl SnapshotRepository for BrokenSnapshots {
    async fn save_snapshot(&self, _session: &Session) -> Result<(), StorageError> {
        Err(StorageError::Io("disk full".into()))
    }

    async fn load_snapshot(&self) -> Result<Option<Session>, StorageError> {
        Err(StorageError::Io("unreadable".into()))
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        Err(StorageError::Io("read-only".into()))
    }
}

/// Pool provider whose fetch always fails.
struct OfflinePool;

#[async_trait]
impl StatementSource for OfflinePool {
    async fn fetch_pool(&self) -> Result<Vec<PoolRecord>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

/// Mark the first `true_required` statements, whatever their labels.
async fn answer_blindly(quiz: &mut QuizStateMachine) {
    let required = quiz.current_ticket().expect("active ticket").true_required as usize;
    for index in 0..required {
        quiz.toggle_selection(index).await.unwrap();
    }
}

#[tokio::test]
async fn full_session_score_equals_sum_of_tickets() {
    let repo = InMemoryRepository::with_statements(pool(6, 6));
    let config = SessionConfig::default();
    let mut quiz = QuizStateMachine::new(config, Arc::new(repo.clone()), Arc::new(repo.clone()))
        .with_seed(2024);

    quiz.start().await.unwrap();
    let mut revealed = 0;
    while quiz.phase() == SessionPhase::Active {
        if !quiz.current_ticket().unwrap().revealed {
            answer_blindly(&mut quiz).await;
        }
        if let AdvanceOutcome::Revealed { .. } = quiz.advance().await.unwrap() {
            revealed += 1;
        }
    }

    assert_eq!(revealed, 40);
    let sum: u32 = quiz.session().tickets().iter().filter_map(|t| t.score()).sum();
    assert_eq!(quiz.scores(), ScoreBoard { running: sum, total_possible: 120 });

    let result = quiz.result().unwrap();
    assert_eq!(result.correct, sum);
    assert_eq!(result.ticket_count, 40);
    assert!(quiz.advance().await.unwrap_err().is_invalid_transition());
    assert_eq!(quiz.scores().running, sum);

    let saved = repo.load_snapshot().await.unwrap().unwrap();
    assert_eq!(&saved, quiz.session());
}

#[tokio::test]
async fn finished_session_can_be_restarted() {
    let storage = Storage::in_memory(pool(3, 3));
    let config = SessionConfig::new(1, 3, TrueQuota::new(2, 2).unwrap()).unwrap();
    let mut quiz =
        QuizStateMachine::new(config, storage.statements, storage.snapshots.clone()).with_seed(5);

    quiz.start().await.unwrap();
    answer_blindly(&mut quiz).await;
    quiz.advance().await.unwrap();
    quiz.advance().await.unwrap();
    assert_eq!(quiz.phase(), SessionPhase::Finished);

    quiz.start().await.unwrap();
    assert_eq!(quiz.phase(), SessionPhase::Active);
    assert_eq!(quiz.scores().running, 0);
    assert_eq!(quiz.session().current_ticket_index(), 0);
    assert_eq!(storage.snapshots.load_snapshot().await.unwrap().as_ref(), Some(quiz.session()));
}

#[tokio::test]
async fn persistence_faults_never_break_play() {
    let repo = InMemoryRepository::with_statements(pool(5, 5));
    let config = SessionConfig::new(2, 3, TrueQuota::new(1, 2).unwrap()).unwrap();
    let mut quiz = QuizStateMachine::resume(config, Arc::new(repo), Arc::new(BrokenSnapshots))
        .await
        .with_seed(9);
    assert_eq!(quiz.phase(), SessionPhase::Idle);

    quiz.start().await.unwrap();
    answer_blindly(&mut quiz).await;
    quiz.advance().await.unwrap();
    quiz.advance().await.unwrap();
    assert_eq!(quiz.session().current_ticket_index(), 1);

    quiz.reset().await;
    assert_eq!(quiz.session(), &Session::idle(&config));
}

#[tokio::test]
async fn pool_failure_aborts_start() {
    let repo = InMemoryRepository::new();
    let mut quiz =
        QuizStateMachine::new(SessionConfig::default(), Arc::new(OfflinePool), Arc::new(repo.clone()));

    let err = quiz.start().await.unwrap_err();
    assert!(matches!(err, QuizError::PoolUnavailable(_)));
    assert_eq!(quiz.phase(), SessionPhase::Idle);
    assert!(repo.raw_snapshot().unwrap().is_none());
}

#[tokio::test]
async fn pool_too_small_is_a_config_error() {
    let repo = InMemoryRepository::with_statements(pool(1, 5));
    let mut quiz = QuizStateMachine::new(
        SessionConfig::default(),
        Arc::new(repo.clone()),
        Arc::new(repo),
    );

    let err = quiz.start().await.unwrap_err();
    assert!(matches!(err, QuizError::Config(_)));
    assert!(!err.is_invalid_transition());
    assert_eq!(quiz.phase(), SessionPhase::Idle);
}
