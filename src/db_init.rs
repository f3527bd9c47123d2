use crate::storage::{InMemoryStorage, StorageBackend, StorageError};
use crate::types::{Quiz, QuizQuestion, Role, TargetAction, User};
use crate::types::{Campaign, GeoPoint, Issue, IssueCategory, IssueStatus, TimelineEntry};
use bcrypt::{hash, DEFAULT_COST};
use chrono::{Duration, Utc};
use uuid::Uuid;

pub fn initialize_default_accounts(
    storage: &mut InMemoryStorage,
) -> Result<(), Box<dyn std::error::Error>> {
    if storage
        .get_user_by_email("admin@react.dev")
        .unwrap_or(None)
        .is_some()
    {
        println!("Default accounts already exist, skipping initialization");
        return Ok(());
    }

    println!("👤 Initializing default accounts...");

    // One bcrypt run shared by every dev account
    let demo_password_hash = hash("demo123", DEFAULT_COST)?;

    let mut admin = User::new("admin", "admin@react.dev", &demo_password_hash, Role::Admin);
    let mut authority = User::new(
        "city_works",
        "authority@react.dev",
        &demo_password_hash,
        Role::Authority,
    );
    let citizens = [
        ("asha", "asha@react.dev"),
        ("ravi", "ravi@react.dev"),
        ("meera", "meera@react.dev"),
    ];

    admin.created_at = Utc::now() - Duration::days(30);
    authority.created_at = Utc::now() - Duration::days(30);

    storage.store_user(&admin)?;
    storage.store_user(&authority)?;
    for (username, email) in citizens {
        let citizen = User::new(username, email, &demo_password_hash, Role::Citizen);
        match storage.store_user(&citizen) {
            Ok(()) => println!("   ✅ Created citizen account: {}", username),
            Err(StorageError::DuplicateKey(_)) => {
                println!("   - Citizen '{}' already exists, skipping", username)
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("✅ Default accounts created successfully!");
    println!("   - Admin:     admin / demo123");
    println!("   - Authority: city_works / demo123");
    println!("   - Citizens:  asha, ravi, meera / demo123");

    Ok(())
}

pub fn initialize_sample_campaign(
    storage: &mut InMemoryStorage,
) -> Result<(), Box<dyn std::error::Error>> {
    let title = "Pothole Patrol Week";
    if storage
        .list_campaigns()?
        .iter()
        .any(|c| c.title == title)
    {
        println!("Sample campaign already exists, skipping");
        return Ok(());
    }

    let admin = storage
        .get_user_by_email("admin@react.dev")?
        .ok_or("default admin missing; run account initialization first")?;

    let now = Utc::now();
    let campaign = Campaign {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "Report three road issues in your neighbourhood this week.".to_string(),
        target_action: TargetAction::Report,
        target_goal: 3,
        reward_points: 100,
        reward_badge: "Road Guardian".to_string(),
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(13),
        participants: Vec::new(),
        created_by: admin.id,
        created_at: now,
        updated_at: now,
    };
    storage.store_campaign(&campaign)?;

    println!("✅ Sample campaign created: {} (Report x3, 100 pts)", title);
    Ok(())
}

pub fn initialize_sample_quiz(
    storage: &mut InMemoryStorage,
) -> Result<(), Box<dyn std::error::Error>> {
    let title = "Civic Sense Basics";
    if storage.list_quizzes()?.iter().any(|q| q.title == title) {
        println!("Sample quiz already exists, skipping");
        return Ok(());
    }

    let admin = storage
        .get_user_by_email("admin@react.dev")?
        .ok_or("default admin missing; run account initialization first")?;

    let now = Utc::now();
    let quiz = Quiz {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "Quick check on everyday civic habits.".to_string(),
        points_awarded: 20,
        questions: vec![
            QuizQuestion {
                text: "Where should construction debris be disposed of?".to_string(),
                options: vec![
                    "Any empty plot".to_string(),
                    "A designated debris collection point".to_string(),
                    "The nearest storm drain".to_string(),
                ],
                correct_answer_index: 1,
            },
            QuizQuestion {
                text: "A streetlight near you has been dark for a week. What helps most?".to_string(),
                options: vec![
                    "Waiting for someone else to report it".to_string(),
                    "Reporting it with its location".to_string(),
                ],
                correct_answer_index: 1,
            },
            QuizQuestion {
                text: "Why verify issues reported by others?".to_string(),
                options: vec![
                    "Verified issues reach authorities with more weight".to_string(),
                    "It deletes duplicate reports".to_string(),
                    "It is required to keep your account".to_string(),
                ],
                correct_answer_index: 0,
            },
        ],
        created_by: admin.id,
        created_at: now,
        updated_at: now,
    };
    storage.store_quiz(&quiz)?;

    println!("✅ Sample quiz created: {} (3 questions, 20 pts)", title);
    Ok(())
}

pub fn initialize_sample_issue(
    storage: &mut InMemoryStorage,
) -> Result<(), Box<dyn std::error::Error>> {
    let title = "Broken streetlight on Station Road";
    if storage.list_issues()?.iter().any(|i| i.title == title) {
        println!("Sample issue already exists, skipping");
        return Ok(());
    }

    let reporter = storage
        .get_user_by_email("asha@react.dev")?
        .ok_or("default citizen missing; run account initialization first")?;

    let now = Utc::now();
    let issue = Issue {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "The light opposite the station entrance has been out for days.".to_string(),
        category: IssueCategory::Electricity,
        status: IssueStatus::Pending,
        location: GeoPoint {
            longitude: 77.5946,
            latitude: 12.9716,
        },
        media_url: None,
        reported_by: reporter.id,
        verifications: Vec::new(),
        timeline: vec![TimelineEntry::new(
            IssueStatus::Pending,
            "Issue reported.",
            Some(reporter.id),
        )],
        comments: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    storage.store_issue(&issue)?;

    println!("✅ Sample issue created: {}", title);
    Ok(())
}

pub fn setup_development_data(
    storage: &mut InMemoryStorage,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 Setting up development data...");

    initialize_default_accounts(storage)?;
    initialize_sample_campaign(storage)?;
    initialize_sample_quiz(storage)?;
    initialize_sample_issue(storage)?;

    println!("🎉 Development data setup complete!");
    println!();
    println!("📋 Available test accounts (all use password: demo123):");
    println!("   🛠  Admin:     admin@react.dev");
    println!("   🏛  Authority: authority@react.dev");
    println!("   🙋 Citizens:  asha@react.dev, ravi@react.dev, meera@react.dev");
    println!();

    Ok(())
}
