use react_engine::{
    CampaignsEngine, GamificationEngine, GeoPoint, InMemoryStorage, IssueCategory, IssuesEngine,
    NewCampaign, NewIssue, PushDispatcher, QuizEngine, QuizQuestion, Role, StorageBackend,
    StoredMedia, TargetAction, User,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    println!("=== reACT Civic Platform Demo: Report, Verify, Resolve ===\n");

    // One shared storage instance behind all engines
    let shared_storage = Arc::new(std::sync::Mutex::new(InMemoryStorage::new()));

    let ledger = GamificationEngine::new(Arc::clone(&shared_storage));
    let campaigns_engine = CampaignsEngine::new(Arc::clone(&shared_storage), ledger.clone());
    let push_dispatcher = PushDispatcher::new(Arc::clone(&shared_storage));
    let issues_engine = IssuesEngine::new(
        Arc::clone(&shared_storage),
        ledger.clone(),
        campaigns_engine.clone(),
        push_dispatcher.clone(),
    );
    let quiz_engine = QuizEngine::new(Arc::clone(&shared_storage), ledger.clone());

    println!("1. Seeding residents and an authority account...");

    let admin = User::new("admin", "admin@react.dev", "demo-hash", Role::Admin);
    let authority = User::new(
        "city_works",
        "authority@react.dev",
        "demo-hash",
        Role::Authority,
    );
    let asha = User::new("asha", "asha@react.dev", "demo-hash", Role::Citizen);
    let neighbors: Vec<User> = (1..=5)
        .map(|n| {
            User::new(
                &format!("neighbor_{n}"),
                &format!("neighbor{n}@react.dev"),
                "demo-hash",
                Role::Citizen,
            )
        })
        .collect();

    {
        let mut storage = shared_storage.lock().unwrap();
        storage.store_user(&admin).unwrap();
        storage.store_user(&authority).unwrap();
        storage.store_user(&asha).unwrap();
        for neighbor in &neighbors {
            storage.store_user(neighbor).unwrap();
        }
    }
    println!("   Accounts created: {} citizens + authority + admin", neighbors.len() + 1);

    println!("\n2. Admin launches a reporting campaign...");

    let now = Utc::now();
    let campaign = campaigns_engine
        .create_campaign(
            NewCampaign {
                title: "Pothole Patrol Week".to_string(),
                description: "Report two road hazards this week".to_string(),
                target_action: TargetAction::Report,
                target_goal: 2,
                reward_points: 100,
                reward_badge: "Road Guardian".to_string(),
                start_date: now - Duration::days(1),
                end_date: now + Duration::days(6),
            },
            &admin.id,
        )
        .unwrap();
    println!("   Campaign: \"{}\" (goal: {} reports)", campaign.title, campaign.target_goal);

    campaigns_engine.join(&campaign.id, &asha.id).unwrap();
    println!("   asha joined the campaign");

    println!("\n3. asha reports civic issues...");

    let pothole = issues_engine
        .create_issue(
            &asha.id,
            NewIssue {
                title: "Deep pothole near bus stop".to_string(),
                description: "Rickshaws are swerving into oncoming traffic to avoid it".to_string(),
                category: IssueCategory::Roads,
                client_location: Some(GeoPoint {
                    longitude: 77.5946,
                    latitude: 12.9716,
                }),
                media: None,
            },
        )
        .unwrap();
    println!("   Issue 1: \"{}\" [{}]", pothole.title, pothole.status);

    let streetlight = issues_engine
        .create_issue(
            &asha.id,
            NewIssue {
                title: "Streetlight out on Station Road".to_string(),
                description: "Whole stretch is dark after 7pm".to_string(),
                category: IssueCategory::Electricity,
                client_location: Some(GeoPoint {
                    longitude: 77.5801,
                    latitude: 12.9698,
                }),
                media: None,
            },
        )
        .unwrap();
    println!("   Issue 2: \"{}\" [{}]", streetlight.title, streetlight.status);

    let progress = campaigns_engine
        .get_campaign(&campaign.id)
        .unwrap()
        .participants
        .iter()
        .find(|p| p.user_id == asha.id)
        .map(|p| (p.progress, p.is_complete))
        .unwrap();
    println!(
        "   Campaign progress: {}/{} reports, complete: {}",
        progress.0, campaign.target_goal, progress.1
    );

    println!("\n4. The neighborhood verifies the pothole...");

    for (i, neighbor) in neighbors.iter().enumerate() {
        let outcome = issues_engine
            .toggle_verification(&pothole.id, &neighbor.id)
            .unwrap();
        println!(
            "   Verification {}: count={}, status={}",
            i + 1,
            outcome.verifications_count,
            outcome.new_status
        );
    }

    issues_engine
        .add_comment(&pothole.id, &neighbors[0].id, "Nearly lost my scooter here yesterday.")
        .unwrap();
    println!("   neighbor_1 left a comment");

    println!("\n5. The city authority resolves it with photo proof...");

    let resolved = issues_engine
        .resolve_with_proof(
            &pothole.id,
            &authority.id,
            Some("Crew filled and sealed the pothole.".to_string()),
            StoredMedia {
                url: "/uploads/demo-resolution-proof.jpg".to_string(),
                gps: None,
            },
        )
        .await
        .unwrap();
    println!(
        "   Issue now [{}], timeline entries: {}",
        resolved.status,
        resolved.timeline.len()
    );

    println!("\n6. Civic awareness quiz...");

    let quiz = quiz_engine
        .create_quiz(
            "Civic Sense Basics",
            "How well do you know your city?",
            20,
            vec![
                QuizQuestion {
                    text: "Where should construction debris go?".to_string(),
                    options: vec![
                        "The storm drain".to_string(),
                        "A registered debris collection point".to_string(),
                    ],
                    correct_answer_index: 1,
                },
                QuizQuestion {
                    text: "A streetlight is out. Best first step?".to_string(),
                    options: vec![
                        "Wait for someone else".to_string(),
                        "Report it with its pole number".to_string(),
                    ],
                    correct_answer_index: 1,
                },
            ],
            &admin.id,
        )
        .unwrap();

    let answers: HashMap<usize, usize> = HashMap::from([(0, 1), (1, 1)]);
    let submission = quiz_engine.submit(&quiz.id, &asha.id, &answers).unwrap();
    println!("   {}", submission.message);

    println!("\n7. Leaderboard (citizens by impact score):");

    let leaderboard = ledger.leaderboard(10).unwrap();
    for (rank, entry) in leaderboard.iter().enumerate() {
        println!(
            "   #{} {} - {} pts, streak {}, impact {}",
            rank + 1,
            entry.username,
            entry.points,
            entry.streak,
            entry.impact_score
        );
    }

    let final_asha = {
        let storage = shared_storage.lock().unwrap();
        storage.get_user(&asha.id).unwrap().unwrap()
    };
    println!(
        "\n   asha's badges: {:?} (campaign reward: {} pts)",
        final_asha.badges, campaign.reward_points
    );

    println!("\n=== Demo shows the full civic loop ===");
    println!("✓ Issues Engine: Report filed with GPS, verified by 5 neighbors, resolved with proof");
    println!("✓ Campaigns Engine: Joined, progressed per report, completed with badge + points");
    println!("✓ Gamification Engine: Points, streaks and impact scores feeding the leaderboard");
    println!("✓ Quiz Engine: Scored attempt with one-time point award");
    println!("✓ Push Dispatcher: Status updates delivered when a reporter subscribes a device");

    // How many issues ended up in the system
    let total_issues = issues_engine.list_issues().unwrap().len();
    let total_campaigns = campaigns_engine.list_all().unwrap().len();
    println!("\nSystem summary: {total_issues} issues, {total_campaigns} campaign(s)");
}
