use std::error::Error;

use bcrypt::hash;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use futures::future::try_join_all;
use uuid::Uuid;

use flat_twitter::models::{Tweet, User, UserRecord};
use flat_twitter::{Config, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("Starting data seeding...");
    let _ = dotenv::dotenv();

    let config = Config::from_env()?;
    let store = Store::open(&config.storage).await?;

    let mut args = std::env::args().skip(1);
    let num_users = args.next().map(|s| s.parse::<usize>()).transpose()?;
    let tweets_per_user = args.next().map(|s| s.parse::<usize>()).transpose()?;

    let users = seed_users(&store, num_users.unwrap_or(20), config.bcrypt_cost).await?;
    seed_tweets(&store, &users, tweets_per_user.unwrap_or(5)).await?;

    println!("Seeding completed!");
    Ok(())
}

async fn seed_users(store: &Store, count: usize, cost: u32) -> Result<Vec<User>, Box<dyn Error>> {
    println!("Creating {} users...", count);
    // Every seeded account shares one password.
    let password_hash = hash("password123", cost)?;
    let mut users = Vec::with_capacity(count);

    for i in 0..count {
        let user = User {
            user_id: Uuid::new_v4(),
            email: SafeEmail().fake(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            birthday: None,
        };

        store
            .users
            .append(UserRecord {
                user: user.clone(),
                password_hash: password_hash.clone(),
            })
            .await?;

        println!(
            "Created user {}/{}: {} {} ({})",
            i + 1,
            count,
            user.first_name,
            user.last_name,
            user.user_id
        );
        users.push(user);
    }

    Ok(users)
}

async fn seed_tweets(
    store: &Store,
    users: &[User],
    tweets_per_user: usize,
) -> Result<(), Box<dyn Error>> {
    println!("Creating {} tweets per user...", tweets_per_user);

    for user in users {
        let posts = (0..tweets_per_user).map(|_| {
            let content: String = Sentence(3..10).fake();
            store.tweets.append(Tweet {
                tweet_id: Uuid::new_v4(),
                content,
                created_at: chrono::Utc::now(),
                updated_at: None,
                by: user.clone(),
            })
        });
        try_join_all(posts).await?;
    }

    println!("Created {} tweets", users.len() * tweets_per_user);
    Ok(())
}
