use log::info;
use mongodb::bson::{Document, doc};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};

use crate::utils::config::AppConfig;

pub async fn connect_to_mongo(config: &AppConfig) -> mongodb::error::Result<Database> {
    let mut client_options = ClientOptions::parse(&config.mongodb_uri).await?;
    client_options.app_name = Some("blogicum-api".to_string());

    let client = Client::with_options(client_options)?;

    // Ping the server to see if you can connect to the cluster
    client.database("admin").run_command(doc! {"ping": 1}).await?;

    info!("Connected successfully to MongoDB");

    let db = client.database(&config.database_name);
    ensure_indexes(&db).await?;
    Ok(db)
}

async fn unique_index(db: &Database, collection: &str, field: &str) -> mongodb::error::Result<()> {
    let model = IndexModel::builder()
        .keys(doc! { field: 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<Document>(collection).create_index(model).await?;
    Ok(())
}

/// Unique usernames and slugs, plus the comment lookup by post.
async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    unique_index(db, "users", "username").await?;
    unique_index(db, "categories", "slug").await?;

    let by_post = IndexModel::builder().keys(doc! { "post_id": 1 }).build();
    db.collection::<Document>("comments").create_index(by_post).await?;
    Ok(())
}
