use board_governance::db::Database;
use board_governance::models::{Resolution, ResolutionStatus, Vote, VoteChoice, VotingType};
use board_governance::tasks::deadline_closer::close_expired_resolutions;
use board_governance::voting::tally::UnanimityPolicy;
use board_governance::voting::workflow::{ResolutionEvent, ResolutionWorkflow};
use board_governance::GovernanceError;
use chrono::{Duration, Utc};

async fn memory_db() -> Database {
    Database::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory database")
}

async fn open_resolution(db: &Database, voting_type: VotingType, quorum: u32) -> Resolution {
    let resolution = Resolution::new(
        Some("meeting-42".into()),
        "Approve FY27 budget".into(),
        Some("Operating and capital budget".into()),
        voting_type,
        quorum,
        None,
    )
    .unwrap();
    db.create_resolution(&resolution).await.unwrap();
    db.open_resolution(&resolution.id, &ResolutionWorkflow::default(), Utc::now())
        .await
        .unwrap()
}

async fn cast(db: &Database, resolution: &Resolution, voter: &str, choice: VoteChoice) {
    let vote = Vote::new(resolution.id.clone(), voter.into(), choice, None);
    db.cast_vote(&vote).await.unwrap();
}

#[tokio::test]
async fn create_and_fetch_round_trip() {
    let db = memory_db().await;
    let resolution = Resolution::new(None, "Elect chair".into(), None, VotingType::TwoThirds, 4, Some(60)).unwrap();
    db.create_resolution(&resolution).await.unwrap();

    let fetched = db.get_resolution(&resolution.id).await.unwrap();
    assert_eq!(fetched.status, ResolutionStatus::Draft);
    assert_eq!(fetched.voting_type, VotingType::TwoThirds);
    assert_eq!(fetched.quorum_required, 4);
    assert!(fetched.voting_deadline.is_some());
    assert!(fetched.opened_at.is_none());
}

#[tokio::test]
async fn unknown_resolution_is_not_found() {
    let db = memory_db().await;
    let err = db.get_resolution("missing").await.unwrap_err();
    assert!(matches!(err, GovernanceError::NotFound(_)));
}

#[tokio::test]
async fn empty_title_is_rejected() {
    let db = memory_db().await;
    let resolution = Resolution::new(None, "  ".into(), None, VotingType::SimpleMajority, 0, None).unwrap();
    assert!(matches!(
        db.create_resolution(&resolution).await,
        Err(GovernanceError::Validation(_))
    ));
}

#[tokio::test]
async fn opening_twice_fails_and_keeps_state() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::SimpleMajority, 0).await;
    assert_eq!(opened.status, ResolutionStatus::Open);

    let err = db
        .open_resolution(&opened.id, &ResolutionWorkflow::default(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::InvalidStateTransition { from: ResolutionStatus::Open, event: ResolutionEvent::OpenVoting }
    ));

    let stored = db.get_resolution(&opened.id).await.unwrap();
    assert_eq!(stored.status, ResolutionStatus::Open);
    assert_eq!(stored.opened_at.map(|t| t.timestamp_micros()), opened.opened_at.map(|t| t.timestamp_micros()));
}

#[tokio::test]
async fn votes_require_an_open_resolution() {
    let db = memory_db().await;
    let resolution = Resolution::new(None, "Draft motion".into(), None, VotingType::SimpleMajority, 0, None).unwrap();
    db.create_resolution(&resolution).await.unwrap();

    let vote = Vote::new(resolution.id.clone(), "alice".into(), VoteChoice::Approve, None);
    assert!(matches!(db.cast_vote(&vote).await, Err(GovernanceError::Validation(_))));
    assert!(db.get_resolution_votes(&resolution.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn one_vote_per_voter() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::SimpleMajority, 0).await;
    cast(&db, &opened, "alice", VoteChoice::Approve).await;

    let again = Vote::new(opened.id.clone(), "alice".into(), VoteChoice::Reject, None);
    assert!(matches!(db.cast_vote(&again).await, Err(GovernanceError::Validation(_))));

    let votes = db.get_resolution_votes(&opened.id).await.unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].choice, VoteChoice::Approve);
}

#[tokio::test]
async fn close_records_passed_outcome() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::SimpleMajority, 5).await;
    for (voter, choice) in [
        ("a", VoteChoice::Approve),
        ("b", VoteChoice::Approve),
        ("c", VoteChoice::Approve),
        ("d", VoteChoice::Reject),
        ("e", VoteChoice::Reject),
    ] {
        cast(&db, &opened, voter, choice).await;
    }

    let decision = db
        .close_resolution(&opened.id, &ResolutionWorkflow::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(decision.resolution.status, ResolutionStatus::Passed);

    let stored = db.get_resolution(&opened.id).await.unwrap();
    assert_eq!(stored.status, ResolutionStatus::Passed);
    assert!(stored.closed_at.is_some());

    // No more votes once closed.
    let late = Vote::new(opened.id.clone(), "f".into(), VoteChoice::Approve, None);
    assert!(db.cast_vote(&late).await.is_err());
}

#[tokio::test]
async fn two_thirds_three_to_two_fails() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::TwoThirds, 5).await;
    for (voter, choice) in [
        ("a", VoteChoice::Approve),
        ("b", VoteChoice::Approve),
        ("c", VoteChoice::Approve),
        ("d", VoteChoice::Reject),
        ("e", VoteChoice::Reject),
    ] {
        cast(&db, &opened, voter, choice).await;
    }

    let decision = db
        .close_resolution(&opened.id, &ResolutionWorkflow::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(decision.resolution.status, ResolutionStatus::Failed);
}

#[tokio::test]
async fn quorum_shortfall_fails() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::SimpleMajority, 3).await;
    cast(&db, &opened, "a", VoteChoice::Approve).await;
    cast(&db, &opened, "b", VoteChoice::Approve).await;

    let decision = db
        .close_resolution(&opened.id, &ResolutionWorkflow::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(decision.resolution.status, ResolutionStatus::Failed);
    assert!(!decision.results.quorum_met);
}

#[tokio::test]
async fn unanimity_policy_is_honoured() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::Unanimous, 5).await;
    for voter in ["a", "b", "c", "d"] {
        cast(&db, &opened, voter, VoteChoice::Approve).await;
    }
    cast(&db, &opened, "e", VoteChoice::Abstain).await;

    let lenient = ResolutionWorkflow::new(UnanimityPolicy::NoRejections);
    let decision = db.close_resolution(&opened.id, &lenient, Utc::now()).await.unwrap();
    assert_eq!(decision.resolution.status, ResolutionStatus::Passed);
}

#[tokio::test]
async fn closing_twice_is_rejected_without_side_effects() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::SimpleMajority, 0).await;
    cast(&db, &opened, "a", VoteChoice::Approve).await;

    let workflow = ResolutionWorkflow::default();
    let first = db.close_resolution(&opened.id, &workflow, Utc::now()).await.unwrap();
    let closed_at = db.get_resolution(&opened.id).await.unwrap().closed_at;

    for _ in 0..2 {
        let err = db.close_resolution(&opened.id, &workflow, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::InvalidStateTransition { from: ResolutionStatus::Passed, event: ResolutionEvent::CloseVoting }
        ));
    }

    let stored = db.get_resolution(&opened.id).await.unwrap();
    assert_eq!(stored.status, first.resolution.status);
    assert_eq!(stored.closed_at, closed_at);
}

#[tokio::test]
async fn list_filters_by_status() {
    let db = memory_db().await;
    let opened = open_resolution(&db, VotingType::SimpleMajority, 0).await;
    let draft = Resolution::new(None, "Later".into(), None, VotingType::SimpleMajority, 0, None).unwrap();
    db.create_resolution(&draft).await.unwrap();

    assert_eq!(db.list_resolutions(None).await.unwrap().len(), 2);
    let open = db.list_resolutions(Some(ResolutionStatus::Open)).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, opened.id);
}

#[tokio::test]
async fn deadline_sweep_closes_only_expired_open_resolutions() {
    let db = memory_db().await;
    let workflow = ResolutionWorkflow::default();

    let expiring = Resolution::new(None, "Expiring".into(), None, VotingType::SimpleMajority, 0, Some(1)).unwrap();
    let lasting = Resolution::new(None, "Lasting".into(), None, VotingType::SimpleMajority, 0, Some(120)).unwrap();
    let unopened = Resolution::new(None, "Unopened".into(), None, VotingType::SimpleMajority, 0, Some(1)).unwrap();
    for r in [&expiring, &lasting, &unopened] {
        db.create_resolution(r).await.unwrap();
    }
    db.open_resolution(&expiring.id, &workflow, Utc::now()).await.unwrap();
    db.open_resolution(&lasting.id, &workflow, Utc::now()).await.unwrap();
    cast(&db, &expiring, "a", VoteChoice::Approve).await;

    let later = Utc::now() + Duration::minutes(5);
    let decisions = close_expired_resolutions(&db, &workflow, later).await.unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].resolution.id, expiring.id);
    assert_eq!(decisions[0].resolution.status, ResolutionStatus::Passed);

    assert_eq!(db.get_resolution(&lasting.id).await.unwrap().status, ResolutionStatus::Open);
    assert_eq!(db.get_resolution(&unopened.id).await.unwrap().status, ResolutionStatus::Draft);

    // A second sweep finds nothing left to close.
    assert!(close_expired_resolutions(&db, &workflow, later).await.unwrap().is_empty());
}
