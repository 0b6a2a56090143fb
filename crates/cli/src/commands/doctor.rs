//! `companion doctor` — Check configuration and backend connectivity.

use std::path::PathBuf;

use companion_core::{ContextStore, Provider, VolatileCache};

pub async fn run(config_path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Project Companion Doctor");
    println!("========================\n");

    let mut issues = 0;

    let config = match crate::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            return Err(e.into());
        }
    };

    for missing in config.missing_for_serve() {
        println!("  ⚠️  Missing {missing}");
        issues += 1;
    }

    // Volatile cache
    let cache = companion_cache::build_from_config(&config.cache).await;
    match cache.ping().await {
        Ok(()) => println!("  ✅ Cache reachable ({})", cache.name()),
        Err(e) => {
            println!("  ⚠️  Cache unreachable ({}): {e}", cache.name());
            issues += 1;
        }
    }

    // Durable store
    match companion_store::build_from_config(&config.store).await {
        Ok(store) => match store.count().await {
            Ok(n) => println!("  ✅ Store ready ({}, {n} stored contexts)", store.name()),
            Err(e) => {
                println!("  ❌ Store query failed ({}): {e}", store.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Store unavailable: {e}");
            issues += 1;
        }
    }

    // Completion provider
    match companion_providers::build_from_config(&config.provider) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider reachable ({} / {})", provider.name(), provider.model()),
            Ok(false) => {
                println!("  ⚠️  Provider rejected the health check ({})", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ⚠️  Provider unreachable ({}): {e}", provider.name());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ⚠️  Provider not configured: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
