//! Model listing functionality

use std::error::Error;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::models::{fetch_models, sort_models};
use crate::api::ModelInfo;
use crate::core::config::defaults::AVAILABLE_MODELS;
use crate::core::config::Settings;
use crate::core::credential::Credential;

/// Some APIs report milliseconds, others seconds.
pub fn format_created(created: u64) -> Option<String> {
    if created == 0 {
        return None;
    }
    let secs = if created > 10_000_000_000 {
        created / 1000
    } else {
        created
    };
    let secs = i64::try_from(secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

fn print_remote(models: &[ModelInfo], current: &str) {
    println!("Found {} models (sorted newest first):", models.len());
    println!();
    for model in models {
        let marker = if model.id == current { " (current)" } else { "" };
        println!("  • {}{marker}", model.id);
        if let Some(owned_by) = &model.owned_by {
            if !owned_by.is_empty() && owned_by != "system" {
                println!("    Owner: {owned_by}");
            }
        }
        if let Some(created) = model.created.and_then(format_created) {
            println!("    Created: {created}");
        }
    }
}

fn print_catalog(current: &str) {
    println!("Built-in catalog:");
    println!();
    for (label, id) in AVAILABLE_MODELS {
        let marker = if *id == current { " (current)" } else { "" };
        println!("  • {id}{marker}");
        println!("    Name: {label}");
    }
}

pub async fn list_models(settings: &Settings) -> Result<(), Box<dyn Error>> {
    println!("🤖 Available models at {}", settings.base_url);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    let credential = settings
        .credential
        .as_ref()
        .filter(|credential| credential.is_usable())
        .map(Credential::expose);

    let remote = match credential {
        Some(api_key) if !settings.mock_mode => {
            let client = reqwest::Client::new();
            match fetch_models(&client, &settings.base_url, api_key).await {
                Ok(response) => Some(response.data),
                Err(err) => {
                    warn!(error = %err, "model listing failed");
                    eprintln!("⚠️  Could not fetch models: {err}");
                    eprintln!();
                    None
                }
            }
        }
        _ => None,
    };

    match remote {
        Some(mut models) if !models.is_empty() => {
            sort_models(&mut models);
            print_remote(&models, &settings.chat.model);
        }
        _ => print_catalog(&settings.chat.model),
    }

    Ok(())
}
