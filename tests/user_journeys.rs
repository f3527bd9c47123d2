/// User Journey Integration Tests
/// Tests complete civic workflows from start to finish
///
/// These tests simulate real resident and authority interactions with the
/// platform, testing multiple engines working together over one storage.
///
/// Run with: cargo test --test user_journeys
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use react_engine::storage::{InMemoryStorage, StorageBackend};
use react_engine::{
    CampaignsEngine, GamificationEngine, GeoPoint, IssueCategory, IssueStatus, IssuesEngine,
    NewCampaign, NewIssue, PushDispatcher, QuizEngine, QuizError, Role, StoredMedia, TargetAction,
    User,
};
use uuid::Uuid;

// Test helper to create engines over one shared storage
#[allow(clippy::type_complexity)]
fn create_test_engines() -> (
    IssuesEngine<InMemoryStorage>,
    CampaignsEngine<InMemoryStorage>,
    QuizEngine<InMemoryStorage>,
    GamificationEngine<InMemoryStorage>,
    Arc<Mutex<InMemoryStorage>>,
) {
    let storage = Arc::new(Mutex::new(InMemoryStorage::new()));
    let ledger = GamificationEngine::new(Arc::clone(&storage));
    let campaigns = CampaignsEngine::new(Arc::clone(&storage), ledger.clone());
    let push = PushDispatcher::new(Arc::clone(&storage));
    let issues = IssuesEngine::new(
        Arc::clone(&storage),
        ledger.clone(),
        campaigns.clone(),
        push,
    );
    let quizzes = QuizEngine::new(Arc::clone(&storage), ledger.clone());
    (issues, campaigns, quizzes, ledger, storage)
}

fn seed_user(storage: &Arc<Mutex<InMemoryStorage>>, name: &str, role: Role) -> Uuid {
    let user = User::new(name, &format!("{name}@react.dev"), "hash", role);
    let id = user.id;
    storage.lock().unwrap().store_user(&user).expect("seed user");
    id
}

fn fetch_user(storage: &Arc<Mutex<InMemoryStorage>>, id: &Uuid) -> User {
    storage
        .lock()
        .unwrap()
        .get_user(id)
        .expect("lookup")
        .expect("user exists")
}

fn report(title: &str) -> NewIssue {
    NewIssue {
        title: title.to_string(),
        description: "Needs the city's attention".to_string(),
        category: IssueCategory::Roads,
        client_location: Some(GeoPoint {
            longitude: 77.5946,
            latitude: 12.9716,
        }),
        media: None,
    }
}

// ============================================================================
// JOURNEY 1: Report, Verify, Resolve
// ============================================================================

#[tokio::test]
async fn journey_report_is_verified_then_resolved_with_proof() {
    println!("\n🕳 JOURNEY 1: Report → Verify → Resolve");
    println!("─────────────────────────────────────────────────────────────");

    let (issues, _campaigns, _quizzes, _ledger, storage) = create_test_engines();

    let asha = seed_user(&storage, "asha", Role::Citizen);
    let authority = seed_user(&storage, "city_works", Role::Authority);
    let neighbors: Vec<Uuid> = (1..=5)
        .map(|n| seed_user(&storage, &format!("neighbor_{n}"), Role::Citizen))
        .collect();

    // Step 1: asha reports a pothole
    let issue = issues
        .create_issue(&asha, report("Deep pothole near bus stop"))
        .expect("report should be filed");
    println!("✓ Step 1: Reported issue [{}]", issue.status);
    assert_eq!(issue.status, IssueStatus::Pending);
    assert_eq!(fetch_user(&storage, &asha).points, 10);

    // Step 2: five neighbors verify, the fifth flips the status
    for (i, neighbor) in neighbors.iter().enumerate() {
        let outcome = issues
            .toggle_verification(&issue.id, neighbor)
            .expect("verification");
        if i < 4 {
            assert_eq!(outcome.new_status, IssueStatus::Pending);
        } else {
            assert_eq!(outcome.new_status, IssueStatus::Verified);
            println!("✓ Step 2: Fifth verification flipped status to Verified");
        }
    }

    // Step 3: a neighbor adds a supporting comment
    issues
        .add_comment(&issue.id, &neighbors[0], "Nearly lost my scooter here.")
        .expect("comment");
    println!("✓ Step 3: Comment added");
    assert_eq!(fetch_user(&storage, &neighbors[0]).points, 3);

    // Step 4: the authority picks it up
    let in_progress = issues
        .update_status(&issue.id, &authority, IssueStatus::InProgress, None)
        .await
        .expect("authority update");
    assert_eq!(in_progress.status, IssueStatus::InProgress);
    println!("✓ Step 4: Authority moved issue to In Progress");

    // Step 5: resolved with photo proof
    let resolved = issues
        .resolve_with_proof(
            &issue.id,
            &authority,
            Some("Crew filled and sealed the pothole.".to_string()),
            StoredMedia {
                url: "/uploads/proof.jpg".to_string(),
                gps: None,
            },
        )
        .await
        .expect("resolution");
    assert_eq!(resolved.status, IssueStatus::Resolved);
    let last = resolved.timeline.last().expect("timeline entry");
    assert!(last.resolution_media_url.is_some());
    println!("✓ Step 5: Resolved with proof photo");

    // The full status history is on the timeline
    let statuses: Vec<IssueStatus> = resolved.timeline.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            IssueStatus::Pending,
            IssueStatus::Verified,
            IssueStatus::InProgress,
            IssueStatus::Resolved,
        ]
    );

    // Point flows: reporter 10 + 25 bonus, authority 2 for the proof
    let asha_after = fetch_user(&storage, &asha);
    assert_eq!(asha_after.points, 35);
    assert_eq!(asha_after.streak, 1);
    assert_eq!(asha_after.impact_score, 40);
    assert_eq!(fetch_user(&storage, &authority).points, 2);

    println!("✅ Journey 1 complete: civic loop closed!\n");
}

// ============================================================================
// JOURNEY 2: Campaign Sprint
// ============================================================================

#[test]
fn journey_citizen_completes_a_reporting_campaign() {
    println!("\n🏁 JOURNEY 2: Campaign Sprint");
    println!("─────────────────────────────────────────────────────────────");

    let (issues, campaigns, _quizzes, _ledger, storage) = create_test_engines();

    let admin = seed_user(&storage, "admin", Role::Admin);
    let ravi = seed_user(&storage, "ravi", Role::Citizen);

    // Step 1: admin launches a three-report campaign
    let now = Utc::now();
    let campaign = campaigns
        .create_campaign(
            NewCampaign {
                title: "Pothole Patrol Week".to_string(),
                description: "Report three road hazards".to_string(),
                target_action: TargetAction::Report,
                target_goal: 3,
                reward_points: 100,
                reward_badge: "Road Guardian".to_string(),
                start_date: now - Duration::days(1),
                end_date: now + Duration::days(6),
            },
            &admin,
        )
        .expect("campaign");
    println!("✓ Step 1: Campaign launched (goal 3)");

    // Step 2: ravi joins
    campaigns.join(&campaign.id, &ravi).expect("join");
    println!("✓ Step 2: ravi joined");

    // Step 3: three reports complete the campaign
    for n in 1..=3 {
        issues
            .create_issue(&ravi, report(&format!("Hazard {n}")))
            .expect("report");
    }
    let after = fetch_user(&storage, &ravi);
    // 3 reports x 10 + 100 campaign reward
    assert_eq!(after.points, 130);
    assert_eq!(after.badges, vec!["Road Guardian".to_string()]);
    println!("✓ Step 3: Campaign completed, badge and points granted");

    // Step 4: a fourth report earns report points only
    issues
        .create_issue(&ravi, report("Hazard 4"))
        .expect("report");
    let final_state = fetch_user(&storage, &ravi);
    assert_eq!(final_state.points, 140);
    assert_eq!(final_state.badges.len(), 1);

    let stored = campaigns.get_campaign(&campaign.id).expect("fetch");
    let participant = stored
        .participants
        .iter()
        .find(|p| p.user_id == ravi)
        .expect("participant");
    assert_eq!(participant.progress, 3);
    assert!(participant.is_complete);
    println!("✓ Step 4: Completed run stays frozen");

    println!("✅ Journey 2 complete: campaign rewards exactly once!\n");
}

// ============================================================================
// JOURNEY 3: Quiz Retake
// ============================================================================

#[test]
fn journey_failed_quiz_can_be_retaken_until_passed() {
    println!("\n📚 JOURNEY 3: Quiz Retake");
    println!("─────────────────────────────────────────────────────────────");

    let (_issues, _campaigns, quizzes, _ledger, storage) = create_test_engines();

    let admin = seed_user(&storage, "admin", Role::Admin);
    let meera = seed_user(&storage, "meera", Role::Citizen);

    let quiz = quizzes
        .create_quiz(
            "Civic Sense Basics",
            "Everyday habits",
            20,
            vec![
                react_engine::QuizQuestion {
                    text: "Debris goes where?".to_string(),
                    options: vec!["Drain".to_string(), "Collection point".to_string()],
                    correct_answer_index: 1,
                },
                react_engine::QuizQuestion {
                    text: "Dark streetlight?".to_string(),
                    options: vec!["Ignore".to_string(), "Report it".to_string()],
                    correct_answer_index: 1,
                },
            ],
            &admin,
        )
        .expect("quiz");

    // Step 1: a blank attempt fails
    let failed = quizzes
        .submit(&quiz.id, &meera, &HashMap::new())
        .expect("failed attempt");
    assert!(!failed.attempted);
    assert_eq!(fetch_user(&storage, &meera).points, 0);
    println!("✓ Step 1: First attempt failed, no points");

    // Step 2: the retake passes and pays out
    let passed = quizzes
        .submit(&quiz.id, &meera, &HashMap::from([(0, 1), (1, 1)]))
        .expect("passing attempt");
    assert!(passed.attempted);
    assert_eq!(passed.points_awarded, 20);
    assert_eq!(fetch_user(&storage, &meera).points, 20);
    println!("✓ Step 2: Retake passed, 20 points");

    // Step 3: further submissions are blocked
    let err = quizzes
        .submit(&quiz.id, &meera, &HashMap::from([(0, 1), (1, 1)]))
        .unwrap_err();
    assert!(matches!(err, QuizError::AlreadyPassed { .. }));
    assert_eq!(fetch_user(&storage, &meera).points, 20);
    println!("✓ Step 3: Resubmission blocked, no double credit");

    // One attempt row, marked passed
    let history = quizzes.my_attempts(&meera).expect("history");
    assert_eq!(history.len(), 1);
    assert!(history[0].passed);

    println!("✅ Journey 3 complete: quiz pays exactly once!\n");
}

// ============================================================================
// JOURNEY 4: Leaderboard Assembly
// ============================================================================

#[test]
fn journey_leaderboard_reflects_community_activity() {
    println!("\n🏆 JOURNEY 4: Leaderboard Assembly");
    println!("─────────────────────────────────────────────────────────────");

    let (issues, _campaigns, _quizzes, ledger, storage) = create_test_engines();

    let asha = seed_user(&storage, "asha", Role::Citizen);
    let ravi = seed_user(&storage, "ravi", Role::Citizen);
    let meera = seed_user(&storage, "meera", Role::Citizen);
    let authority = seed_user(&storage, "city_works", Role::Authority);

    // ravi files one report
    let ravi_issue = issues
        .create_issue(&ravi, report("Streetlight out"))
        .expect("report");

    // asha files two and verifies ravi's
    issues.create_issue(&asha, report("Pothole")).expect("report");
    issues
        .create_issue(&asha, report("Blocked drain"))
        .expect("report");
    issues
        .toggle_verification(&ravi_issue.id, &asha)
        .expect("verify");

    // meera comments, the authority verifies too
    issues
        .add_comment(&ravi_issue.id, &meera, "Same on my street.")
        .expect("comment");
    issues
        .toggle_verification(&ravi_issue.id, &authority)
        .expect("verify");

    println!("✓ Community activity recorded");

    let board = ledger.leaderboard(50).expect("leaderboard");
    let names: Vec<&str> = board.iter().map(|e| e.username.as_str()).collect();

    // asha 22 pts, ravi 10, meera 1; the authority never ranks
    assert_eq!(names, vec!["asha", "ravi", "meera"]);
    assert_eq!(board[0].points, 22);
    assert_eq!(board[0].impact_score, 27);
    assert_eq!(board[1].points, 10);
    assert_eq!(board[2].points, 1);
    assert!(!names.contains(&"city_works"));

    println!("✓ Leaderboard ranks citizens only, by impact score");
    println!("✅ Journey 4 complete: leaderboard assembled!\n");
}

// ============================================================================
// Summary Test
// ============================================================================

#[test]
fn test_summary_user_journeys() {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("             USER JOURNEY TEST SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!("✅ Journey 1: Report verified by the community, resolved with proof");
    println!("✅ Journey 2: Campaign joined, progressed and rewarded once");
    println!("✅ Journey 3: Quiz failed, retaken, passed, then locked");
    println!("✅ Journey 4: Leaderboard assembled from community activity");
    println!("\nAll user journeys validate end-to-end civic workflows!");
    println!("═══════════════════════════════════════════════════════════\n");
}
