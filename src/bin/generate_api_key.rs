//! CLI tool to generate API keys.
//!
//! Usage:
//!   cargo run --bin generate-api-key -- --name "CI - nightly evals" --workspace acme --role contributor --expires-in 365d

use std::env;

use uuid::Uuid;

use skyvidya_eval_lib::config::Config;
use skyvidya_eval_lib::db::DbPool;
use skyvidya_eval_lib::models::ApiKeyRole;
use skyvidya_eval_lib::services::api_key;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let mut name: Option<String> = None;
    let mut workspace_slug: Option<String> = None;
    let mut create_workspace = false;
    let mut role = "contributor".to_string();
    let mut expires_in: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--name" | "-n" => {
                i += 1;
                if i < args.len() {
                    name = Some(args[i].clone());
                }
            }
            "--workspace" | "-w" => {
                i += 1;
                if i < args.len() {
                    workspace_slug = Some(args[i].clone());
                }
            }
            "--create-workspace" => {
                create_workspace = true;
            }
            "--role" | "-r" => {
                i += 1;
                if i < args.len() {
                    role = args[i].clone();
                }
            }
            "--expires-in" | "-e" => {
                i += 1;
                if i < args.len() {
                    expires_in = Some(args[i].clone());
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    // Validate required arguments
    let name = match name {
        Some(n) => n,
        None => {
            eprintln!("Error: --name is required");
            print_usage();
            std::process::exit(1);
        }
    };

    // Parse role
    let role_enum = match ApiKeyRole::parse(&role) {
        Some(r) => r,
        None => {
            eprintln!(
                "Error: Invalid role '{}'. Must be: admin, contributor, viewer",
                role
            );
            std::process::exit(1);
        }
    };

    // Load config and connect
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::connect(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.migrate().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    // Resolve (or bootstrap) the workspace
    let workspace_id = match workspace_slug {
        Some(ref slug) => {
            let existing = match pool.find_workspace_by_slug(slug).await {
                Ok(ws) => ws,
                Err(e) => {
                    eprintln!("Error looking up workspace: {}", e);
                    std::process::exit(1);
                }
            };
            match existing {
                Some(ws) => Some(ws.id),
                None if create_workspace => {
                    match pool.insert_workspace(Uuid::now_v7(), slug, slug).await {
                        Ok(ws) => {
                            println!("Created workspace '{}' ({})", slug, ws.id);
                            Some(ws.id)
                        }
                        Err(e) => {
                            eprintln!("Error creating workspace: {}", e);
                            std::process::exit(1);
                        }
                    }
                }
                None => {
                    eprintln!(
                        "Error: workspace '{}' not found (use --create-workspace to bootstrap it)",
                        slug
                    );
                    std::process::exit(1);
                }
            }
        }
        None => None, // Instance-wide key
    };

    // Generate the key
    let (full_key, api_key) =
        match api_key::create_key(&pool, &name, workspace_id, role_enum, expires_in.as_deref())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error generating key: {}", e);
                std::process::exit(1);
            }
        };

    // Output
    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("  API Key Generated");
    println!("════════════════════════════════════════════════════════════════");
    println!();
    println!("  ID:        {}", api_key.id);
    println!("  Name:      {}", api_key.name);
    match api_key.workspace_id {
        Some(ws) => println!("  Workspace: {}", ws),
        None => println!("  Workspace: (instance-wide)"),
    }
    println!("  Role:      {}", api_key.role);
    println!("  Prefix:    {}", api_key.key_prefix);
    if let Some(expires) = api_key.expires_at {
        println!("  Expires:   {}", expires.to_rfc3339());
    } else {
        println!("  Expires:   Never");
    }
    println!();
    println!("  Key:       {}", full_key);
    println!();
    println!("  ⚠️  Save this key! It cannot be retrieved later.");
    println!("════════════════════════════════════════════════════════════════");
    println!();
}

fn print_usage() {
    eprintln!();
    eprintln!(
        "Usage: generate-api-key --name <name> [--workspace <slug>] [--role <role>] [--expires-in <duration>]"
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --name, -n          Name for the API key (required)");
    eprintln!("  --workspace, -w     Workspace slug the key is scoped to (omit for instance-wide)");
    eprintln!("  --create-workspace  Create the workspace if it does not exist");
    eprintln!("  --role, -r          Role: admin, contributor, viewer (default: contributor)");
    eprintln!("  --expires-in, -e    Expiration: 30d, 365d, 1y, etc. (default: never)");
    eprintln!("  --help, -h          Show this help");
    eprintln!();
    eprintln!("Examples:");
    eprintln!(
        "  generate-api-key --name \"CI - nightly evals\" --workspace acme --role contributor --expires-in 365d"
    );
    eprintln!("  generate-api-key --name \"Ops\" --role admin");
    eprintln!();
}
