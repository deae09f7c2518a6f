mod config;
mod deck;
mod error;
mod models;
mod srs;
mod store;
mod transfer;
mod tui;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::VocabConfig;
use deck::{Deck, ImportMode, ItemPatch};
use error::VocabError;
use models::{
    format_timestamp, ItemStatus, JsonOutput, PartialVocabItem, Quality, SortBy, SortOrder,
    VocabItem,
};
use srs::Scheduler;
use store::Store;
use tui::truncate;

#[derive(Parser)]
#[command(name = "vocab")]
#[command(about = "A terminal vocabulary trainer with spaced repetition review")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Add a word
    Add {
        word: String,
        definition: String,

        /// Word root or etymology
        #[arg(long, short)]
        root: Option<String>,

        /// Comma-separated tags
        #[arg(long, short)]
        tags: Option<String>,
    },

    /// Submit a word for approval (stored as pending)
    Contribute {
        word: String,
        definition: String,

        #[arg(long, short)]
        root: Option<String>,

        #[arg(long, short)]
        tags: Option<String>,
    },

    /// List words
    List {
        /// Search word, definition, root and tags
        #[arg(long, short)]
        query: Option<String>,

        /// Filter by tag
        #[arg(long, short)]
        tag: Option<String>,

        /// Sort by: date, word, root, tags
        #[arg(long, short, default_value = "date")]
        sort: String,

        /// Sort order: asc or desc
        #[arg(long, short, default_value = "desc")]
        order: String,
    },

    /// Show word details
    Show { id: String },

    /// Edit a word
    Edit {
        id: String,

        #[arg(long, short)]
        word: Option<String>,

        #[arg(long, short)]
        definition: Option<String>,

        #[arg(long, short)]
        root: Option<String>,

        /// Comma-separated tags (replaces existing)
        #[arg(long, short)]
        tags: Option<String>,

        /// published, pending or draft
        #[arg(long, short)]
        status: Option<String>,
    },

    /// Delete a word
    Delete { id: String },

    /// List all tags, or rename/delete one across every word
    Tags {
        /// Rename tag OLD to NEW
        #[arg(long, num_args = 2, value_names = ["OLD", "NEW"], conflicts_with = "delete")]
        rename: Option<Vec<String>>,

        /// Remove a tag from every word
        #[arg(long, value_name = "TAG")]
        delete: Option<String>,
    },

    /// Show the most recently added words
    Recent {
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// List words due for review
    Due,

    /// Pick a word to study (weighted random by default)
    Next {
        /// Step through words in collection order instead
        #[arg(long)]
        sequential: bool,
    },

    /// Record how well a word was recalled
    Review {
        id: String,

        /// 0-5, or again/hard/good/easy/perfect
        #[arg(long, short)]
        quality: String,
    },

    /// Show learning statistics
    Stats,

    /// Export all words as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import words from a JSON file
    Import {
        file: PathBuf,

        /// Replace the collection instead of merging
        #[arg(long)]
        replace: bool,
    },

    /// Show or set the contributor name
    User {
        name: Option<String>,

        /// Forget the stored name
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },

    /// Launch interactive terminal UI
    Tui,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    // stderr keeps --json output on stdout clean
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_quality(raw: &str) -> Result<i32, VocabError> {
    Quality::from_str(raw)
        .map(|q| q.score())
        .ok_or_else(|| VocabError::InvalidQuality(raw.to_string()))
}

fn new_entry(word: String, definition: String, root: Option<String>, tags: Option<String>) -> PartialVocabItem {
    PartialVocabItem {
        root,
        tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
        ..PartialVocabItem::new(word, definition)
    }
}

fn print_json<T: serde::Serialize>(data: T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
    Ok(())
}

fn print_json_err(msg: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(&JsonOutput::<()>::err(msg))?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = VocabConfig::load()?;
    init_tracing(&config.logging.level);

    let db_path = config.resolved_db_path();
    let store = Store::open(&db_path)?;
    store.init()?;

    let key = config.storage.items_key.as_str();
    let scheduler = Scheduler::new(config.srs.clamp_max_ease);
    let mut deck = Deck::new(store.load_items(key)?, scheduler);

    match cli.command {
        Commands::Init => {
            store.save_items(key, deck.items())?;
            if cli.json {
                print_json(())?;
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Add {
            word,
            definition,
            root,
            tags,
        } => {
            let user = store.contributor_name()?;
            let item = deck
                .add_item(new_entry(word, definition, root, tags), Some(&user))
                .clone();
            store.save_items(key, deck.items())?;

            if cli.json {
                print_json(&item)?;
            } else {
                println!("Added '{}' with ID: {}", item.word, item.id);
            }
        }

        Commands::Contribute {
            word,
            definition,
            root,
            tags,
        } => {
            let user = store.contributor_name()?;
            let item = deck
                .submit_contribution(new_entry(word, definition, root, tags), Some(&user))
                .clone();
            store.save_items(key, deck.items())?;

            if cli.json {
                print_json(&item)?;
            } else {
                println!("Submitted '{}' for review with ID: {}", item.word, item.id);
            }
        }

        Commands::List {
            query,
            tag,
            sort,
            order,
        } => {
            let sort_by = SortBy::from_str(&sort)
                .ok_or_else(|| format!("Invalid sort '{}'. Use: date, word, root, tags", sort))?;
            let sort_order = SortOrder::from_str(&order)
                .ok_or_else(|| format!("Invalid order '{}'. Use: asc or desc", order))?;
            let items = deck.filtered(query.as_deref().unwrap_or(""), tag.as_deref(), sort_by, sort_order);

            if cli.json {
                print_json(&items)?;
            } else if items.is_empty() {
                println!("No words found.");
            } else {
                print_table(&items);
            }
        }

        Commands::Show { id } => match deck.get(&id) {
            Some(item) if cli.json => print_json(item)?,
            Some(item) => print_details(item),
            None if cli.json => print_json_err("Word not found")?,
            None => println!("Word not found."),
        },

        Commands::Edit {
            id,
            word,
            definition,
            root,
            tags,
            status,
        } => {
            let status = status
                .map(|s| {
                    ItemStatus::from_str(&s).ok_or_else(|| {
                        format!("Invalid status '{}'. Use: published, pending, draft", s)
                    })
                })
                .transpose()?;
            let patch = ItemPatch {
                word,
                definition,
                root,
                tags: tags.as_deref().map(parse_tags),
                status,
            };
            if patch.is_empty() {
                return Err("Nothing to change. Pass at least one field to edit.".into());
            }

            let item = deck.update_item(&id, patch)?.clone();
            store.save_items(key, deck.items())?;

            if cli.json {
                print_json(&item)?;
            } else {
                println!("Updated '{}'.", item.word);
            }
        }

        Commands::Delete { id } => {
            if deck.delete_item(&id) {
                store.save_items(key, deck.items())?;
                if cli.json {
                    print_json(())?;
                } else {
                    println!("Word {} deleted.", id);
                }
            } else if cli.json {
                print_json_err("Word not found")?;
            } else {
                println!("Word not found.");
            }
        }

        Commands::Tags {
            rename: Some(pair),
            ..
        } => {
            let (old, new) = match pair.as_slice() {
                [old, new] => (old.as_str(), new.as_str()),
                _ => return Err("--rename takes OLD and NEW".into()),
            };
            let changed = deck.rename_tag(old, new);
            if changed > 0 {
                store.save_items(key, deck.items())?;
            }
            if cli.json {
                print_json(serde_json::json!({ "changed": changed }))?;
            } else if changed > 0 {
                println!("Renamed '{}' to '{}' on {} word(s).", old, new.trim(), changed);
            } else {
                println!("Nothing to rename.");
            }
        }

        Commands::Tags {
            delete: Some(tag), ..
        } => {
            let changed = deck.delete_tag(&tag);
            if changed > 0 {
                store.save_items(key, deck.items())?;
            }
            if cli.json {
                print_json(serde_json::json!({ "changed": changed }))?;
            } else if changed > 0 {
                println!("Removed '{}' from {} word(s).", tag, changed);
            } else {
                println!("No words are tagged '{}'.", tag);
            }
        }

        Commands::Tags { .. } => {
            let tags = deck.available_tags();
            if cli.json {
                print_json(&tags)?;
            } else if tags.is_empty() {
                println!("No tags found.");
            } else {
                for tag in tags {
                    println!("{}", tag);
                }
            }
        }

        Commands::Recent { limit } => {
            let items: Vec<&VocabItem> = deck
                .recent(limit.unwrap_or(config.display.recent_words))
                .iter()
                .collect();
            if cli.json {
                print_json(&items)?;
            } else if items.is_empty() {
                println!("No words yet.");
            } else {
                print_table(&items);
            }
        }

        Commands::Due => {
            let due = deck.due_items(Utc::now());
            if cli.json {
                print_json(&due)?;
            } else if due.is_empty() {
                println!("All caught up! No words due for review.");
            } else {
                println!("{} word(s) due for review:", due.len());
                print_table(&due);
            }
        }

        Commands::Next { sequential } => {
            let picked = if sequential {
                let cursor = store.study_cursor()?;
                let item = deck.study_item_at(cursor);
                if item.is_some() {
                    store.set_study_cursor(cursor.wrapping_add(1))?;
                }
                item
            } else {
                deck.next_study_item(Utc::now(), &mut rand::thread_rng())
            };
            if let Some(item) = picked {
                if cli.json {
                    print_json(item)?;
                } else {
                    println!("=== Next Word to Study ===");
                    println!();
                    print_details(item);
                    println!();
                    println!("After recalling it, record how it went with:");
                    println!("  vocab review {} --quality <again|hard|good|easy|perfect>", item.id);
                }
            } else if cli.json {
                print_json(())?;
            } else if deck.is_empty() {
                println!("No words to study yet. Add some words first!");
            } else {
                println!("No words with a definition to study.");
            }
        }

        Commands::Review { id, quality } => {
            let score = parse_quality(&quality)?;
            let item = deck.record_review_result(&id, score)?.clone();
            store.save_items(key, deck.items())?;

            if cli.json {
                print_json(&item)?;
            } else {
                println!("Review recorded for '{}'.", item.word);
                println!(
                    "Repetitions: {} | Interval: {} day(s) | Ease: {:.2}",
                    item.repetitions, item.interval, item.ease
                );
                if let Some(next) = &item.next_review {
                    println!("Next review scheduled: {}", format_timestamp(next));
                }
            }
        }

        Commands::Stats => {
            let stats = deck.stats(Utc::now());
            if cli.json {
                print_json(&stats)?;
            } else {
                println!("=== Learning Statistics ===");
                println!("Total words: {}", stats.total);
                println!("Reviewed: {} ({} not reviewed)", stats.reviewed, stats.not_reviewed);
                println!("Due for review: {}", stats.due);
                println!("Learning (1-3 reps): {}", stats.learning);
                println!("Familiar (4-6 reps): {}", stats.familiar);
                println!("Mastered (7+ reps): {}", stats.mastered);
                match stats.avg_ease {
                    Some(ease) => println!("Average ease: {:.2}", ease),
                    None => println!("Average ease: N/A"),
                }
                if deck.scheduler().clamps_max_ease() {
                    println!("Ease ceiling: {:.1}", srs::MAX_EASE);
                }
            }
        }

        Commands::Export { output } => {
            let text = transfer::export_json(deck.items())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    if cli.json {
                        print_json(serde_json::json!({ "path": path, "count": deck.len() }))?;
                    } else {
                        println!("Exported {} words to {}", deck.len(), path.display());
                    }
                }
                None => println!("{}", text),
            }
        }

        Commands::Import { file, replace } => {
            let raw = std::fs::read_to_string(&file)?;
            let list = transfer::import_json(&raw)?;
            let mode = if replace {
                ImportMode::Replace
            } else {
                ImportMode::Merge
            };
            let report = deck.import_items(list, mode);
            store.save_items(key, deck.items())?;

            if cli.json {
                print_json(&report)?;
            } else {
                println!(
                    "Imported {} words ({}).",
                    report.added,
                    if report.merged { "merged" } else { "replaced" }
                );
                if report.duplicates > 0 {
                    println!("Skipped {} duplicate word(s).", report.duplicates);
                }
            }
        }

        Commands::User { clear: true, .. } => {
            let removed = store.clear_user_name()?;
            if cli.json {
                print_json(serde_json::json!({ "cleared": removed }))?;
            } else if removed {
                println!("Contributor name cleared.");
            } else {
                println!("No contributor name was set.");
            }
        }

        Commands::User { name, .. } => match name {
            Some(name) => {
                store.set_user_name(name.trim())?;
                if cli.json {
                    print_json(serde_json::json!({ "name": name.trim() }))?;
                } else {
                    println!("Contributor name set to '{}'.", name.trim());
                }
            }
            None => {
                let name = store.contributor_name()?;
                let is_default = store.user_name()?.is_none();
                if cli.json {
                    print_json(serde_json::json!({ "name": name, "default": is_default }))?;
                } else if is_default {
                    println!("{} (default)", name);
                } else {
                    println!("{}", name);
                }
            }
        },

        Commands::Tui => {
            tui::run(store, deck, config.storage.items_key.clone())?;
        }
    }

    Ok(())
}

fn print_table(items: &[&VocabItem]) {
    println!("{:<26} {:<20} {:<36} {:<14} NEXT", "ID", "WORD", "DEFINITION", "MASTERY");
    println!("{}", "-".repeat(110));
    for item in items {
        let next = item
            .next_review
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<26} {:<20} {:<36} {:<14} {}",
            item.id,
            truncate(&item.word, 18),
            truncate(&item.definition, 34),
            item.mastery().label(),
            next
        );
    }
}

fn print_details(item: &VocabItem) {
    println!("Word: {}", item.word);
    println!("ID: {}", item.id);
    println!("Definition: {}", item.definition);
    if let Some(root) = &item.root {
        println!("Root: {}", root);
    }
    println!(
        "Tags: {}",
        if item.tags.is_empty() {
            "-".to_string()
        } else {
            item.tags.join(", ")
        }
    );
    if let Some(status) = item.status {
        println!("Status: {}", status.as_str());
    }
    if let Some(created) = &item.created_at {
        println!("Created: {}", created);
    }

    println!();
    println!("--- Review ---");
    let mastery = item.mastery();
    println!("Mastery: {} {}", mastery.emoji(), mastery.label());
    println!(
        "Repetitions: {} | Interval: {} day(s) | Ease: {:.2}",
        item.repetitions, item.interval, item.ease
    );
    match &item.next_review {
        Some(next) => println!("Next review: {}", format_timestamp(next)),
        None => println!("Next review: not scheduled"),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod helper_tests {
        use super::*;

        #[test]
        fn parse_tags_trims_and_drops_empty() {
            assert_eq!(parse_tags(" latin, adj ,,"), vec!["latin".to_string(), "adj".to_string()]);
            assert!(parse_tags("").is_empty());
        }

        #[test]
        fn parse_quality_accepts_labels_and_scores() {
            assert_eq!(parse_quality("good").unwrap(), 3);
            assert_eq!(parse_quality("0").unwrap(), 0);
            assert_eq!(parse_quality("Perfect").unwrap(), 5);
        }

        #[test]
        fn parse_quality_rejects_unknown() {
            assert!(matches!(parse_quality("7"), Err(VocabError::InvalidQuality(_))));
            assert!(matches!(parse_quality("meh"), Err(VocabError::InvalidQuality(_))));
        }

        #[test]
        fn new_entry_splits_tags() {
            let entry = new_entry("a".into(), "b".into(), Some("r".into()), Some("x,y".into()));
            assert_eq!(entry.word, "a");
            assert_eq!(entry.root.as_deref(), Some("r"));
            assert_eq!(entry.tags, vec!["x".to_string(), "y".to_string()]);
            assert!(entry.ease.is_none());
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["vocab", "init"]).unwrap();
            assert!(!cli.json);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_json_flag_global() {
            let cli1 = Cli::try_parse_from(["vocab", "--json", "stats"]).unwrap();
            assert!(cli1.json);

            let cli2 = Cli::try_parse_from(["vocab", "stats", "--json"]).unwrap();
            assert!(cli2.json);
        }

        #[test]
        fn parse_add_with_options() {
            let cli = Cli::try_parse_from([
                "vocab", "add", "laconic", "using few words", "-r", "lakon", "-t", "adj,greek",
            ])
            .unwrap();
            match cli.command {
                Commands::Add {
                    word,
                    definition,
                    root,
                    tags,
                } => {
                    assert_eq!(word, "laconic");
                    assert_eq!(definition, "using few words");
                    assert_eq!(root, Some("lakon".to_string()));
                    assert_eq!(tags, Some("adj,greek".to_string()));
                }
                _ => panic!("Expected Add command"),
            }
        }

        #[test]
        fn parse_list_defaults() {
            let cli = Cli::try_parse_from(["vocab", "list"]).unwrap();
            match cli.command {
                Commands::List {
                    query,
                    tag,
                    sort,
                    order,
                } => {
                    assert!(query.is_none());
                    assert!(tag.is_none());
                    assert_eq!(sort, "date");
                    assert_eq!(order, "desc");
                }
                _ => panic!("Expected List command"),
            }
        }

        #[test]
        fn parse_list_with_filters() {
            let cli = Cli::try_parse_from([
                "vocab", "list", "-q", "lac", "-t", "adj", "--sort", "word", "--order", "asc",
            ])
            .unwrap();
            match cli.command {
                Commands::List {
                    query,
                    tag,
                    sort,
                    order,
                } => {
                    assert_eq!(query, Some("lac".to_string()));
                    assert_eq!(tag, Some("adj".to_string()));
                    assert_eq!(sort, "word");
                    assert_eq!(order, "asc");
                }
                _ => panic!("Expected List command"),
            }
        }

        #[test]
        fn parse_edit_status() {
            let cli =
                Cli::try_parse_from(["vocab", "edit", "v_1", "--status", "draft"]).unwrap();
            match cli.command {
                Commands::Edit { id, status, word, .. } => {
                    assert_eq!(id, "v_1");
                    assert_eq!(status, Some("draft".to_string()));
                    assert!(word.is_none());
                }
                _ => panic!("Expected Edit command"),
            }
        }

        #[test]
        fn parse_review_command() {
            let cli = Cli::try_parse_from(["vocab", "review", "v_7", "--quality", "good"]).unwrap();
            match cli.command {
                Commands::Review { id, quality } => {
                    assert_eq!(id, "v_7");
                    assert_eq!(quality, "good");
                }
                _ => panic!("Expected Review command"),
            }
        }

        #[test]
        fn parse_review_short_flag() {
            let cli = Cli::try_parse_from(["vocab", "review", "v_7", "-q", "4"]).unwrap();
            assert!(matches!(cli.command, Commands::Review { .. }));
        }

        #[test]
        fn parse_import_replace() {
            let cli = Cli::try_parse_from(["vocab", "import", "words.json", "--replace"]).unwrap();
            match cli.command {
                Commands::Import { file, replace } => {
                    assert_eq!(file, PathBuf::from("words.json"));
                    assert!(replace);
                }
                _ => panic!("Expected Import command"),
            }
        }

        #[test]
        fn parse_export_output() {
            let cli = Cli::try_parse_from(["vocab", "export", "-o", "out.json"]).unwrap();
            match cli.command {
                Commands::Export { output } => {
                    assert_eq!(output, Some(PathBuf::from("out.json")));
                }
                _ => panic!("Expected Export command"),
            }
        }

        #[test]
        fn parse_user_optional_name() {
            let show = Cli::try_parse_from(["vocab", "user"]).unwrap();
            assert!(matches!(show.command, Commands::User { name: None, clear: false }));

            let set = Cli::try_parse_from(["vocab", "user", "Ada"]).unwrap();
            assert!(matches!(set.command, Commands::User { name: Some(_), .. }));

            let clear = Cli::try_parse_from(["vocab", "user", "--clear"]).unwrap();
            assert!(matches!(clear.command, Commands::User { clear: true, .. }));

            assert!(Cli::try_parse_from(["vocab", "user", "Ada", "--clear"]).is_err());
        }

        #[test]
        fn parse_simple_commands() {
            for (arg, check) in [
                ("tags", matches!(Cli::try_parse_from(["vocab", "tags"]).unwrap().command, Commands::Tags { rename: None, delete: None })),
                ("due", matches!(Cli::try_parse_from(["vocab", "due"]).unwrap().command, Commands::Due)),
                ("next", matches!(Cli::try_parse_from(["vocab", "next"]).unwrap().command, Commands::Next { sequential: false })),
                ("tui", matches!(Cli::try_parse_from(["vocab", "tui"]).unwrap().command, Commands::Tui)),
            ] {
                assert!(check, "failed to parse '{}'", arg);
            }
        }

        #[test]
        fn parse_tags_rename_takes_two_values() {
            let cli = Cli::try_parse_from(["vocab", "tags", "--rename", "adj", "adjective"]).unwrap();
            match cli.command {
                Commands::Tags { rename, delete } => {
                    assert_eq!(rename, Some(vec!["adj".to_string(), "adjective".to_string()]));
                    assert!(delete.is_none());
                }
                _ => panic!("Expected Tags command"),
            }

            assert!(Cli::try_parse_from(["vocab", "tags", "--rename", "adj"]).is_err());
        }

        #[test]
        fn parse_tags_delete_conflicts_with_rename() {
            let cli = Cli::try_parse_from(["vocab", "tags", "--delete", "adj"]).unwrap();
            assert!(matches!(cli.command, Commands::Tags { delete: Some(_), rename: None }));

            assert!(Cli::try_parse_from([
                "vocab", "tags", "--delete", "adj", "--rename", "a", "b"
            ])
            .is_err());
        }

        #[test]
        fn parse_next_sequential() {
            let cli = Cli::try_parse_from(["vocab", "next", "--sequential"]).unwrap();
            assert!(matches!(cli.command, Commands::Next { sequential: true }));
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            assert!(Cli::try_parse_from(["vocab", "add", "word"]).is_err());
            assert!(Cli::try_parse_from(["vocab", "review", "v_1"]).is_err());
            assert!(Cli::try_parse_from(["vocab", "show"]).is_err());
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["vocab", "invalid"]).is_err());
        }
    }
}
