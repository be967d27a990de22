//! Read commands over the cached dataset.

use super::{print_json, CommandResult, Context, OutputFormat};
use lexicache_store::{Entry, Locale};
use lexicache_sync::{CacheStatus, OfflineAdapter, SyncAdapter};

/// Opens the cache and warns on stderr when it has nothing to serve.
async fn open(ctx: &Context) -> Result<OfflineAdapter, Box<dyn std::error::Error>> {
    let adapter = ctx.adapter()?;
    adapter.init().await?;
    if adapter.status() != CacheStatus::Ready {
        eprintln!(
            "cache at {} is {}; run `lexicache download` first",
            ctx.config()
                .store
                .location
                .path()
                .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string()),
            adapter.status()
        );
    }
    Ok(adapter)
}

fn headline(entry: &Entry, locale: Locale) -> String {
    let word = entry
        .translation(locale)
        .map(|t| t.word)
        .unwrap_or_default();
    format!("{:<24} {:<12} {}", entry.id, entry.korean, word)
}

/// Runs the entry command.
pub async fn entry(ctx: &Context, id: &str, locale: Locale) -> CommandResult {
    let adapter = open(ctx).await?;
    let entry = adapter
        .get_entry(id)
        .await
        .ok_or_else(|| format!("no entry with id {id:?}"))?;
    let localized = entry.localize(locale);

    if ctx.format() == OutputFormat::Json {
        return match &localized {
            Some(localized) => print_json(localized),
            None => print_json(&entry),
        };
    }

    println!("{} ({})", entry.korean, entry.id);
    let Some(localized) = localized else {
        println!("  no {locale} translation");
        return Ok(());
    };
    if !localized.romanization.is_empty() {
        println!("  Romanization: {}", localized.romanization);
    }
    println!("  {}: {}", locale, localized.translation.word);
    if !localized.translation.explanation.is_empty() {
        println!("  {}", localized.translation.explanation);
    }
    println!("  Part of speech: {}", localized.part_of_speech);
    println!("  Difficulty:     {}", localized.difficulty);
    println!("  Category:       {}", localized.category_id);
    if !localized.tags.is_empty() {
        println!("  Tags:           {}", localized.tags.join(", "));
    }
    if localized.has_dialogue {
        println!("  Has example dialogue");
    }
    Ok(())
}

/// Runs the entries command.
pub async fn entries(ctx: &Context, category: &str, locale: Locale) -> CommandResult {
    let adapter = open(ctx).await?;
    let entries = adapter.get_entries_by_category(category).await;

    if ctx.format() == OutputFormat::Json {
        return print_json(&entries);
    }
    for entry in &entries {
        println!("{}", headline(entry, locale));
    }
    println!("{} entries in {category}", entries.len());
    Ok(())
}

/// Runs the categories command.
pub async fn categories(ctx: &Context, locale: Locale) -> CommandResult {
    let adapter = open(ctx).await?;
    let categories = adapter.get_categories().await;

    if ctx.format() == OutputFormat::Json {
        return print_json(&categories);
    }
    for category in &categories {
        println!(
            "{:>4}  {:<20} {} {}",
            category.sort_order,
            category.id,
            category.icon_or_default(),
            category.name(locale)
        );
        let description = category.description(locale);
        if !description.is_empty() {
            println!("      {description}");
        }
    }
    Ok(())
}

/// Runs the conversations command.
pub async fn conversations(ctx: &Context, category: &str, locale: Locale) -> CommandResult {
    let adapter = open(ctx).await?;
    let conversations = adapter.get_conversations_by_category(category).await;

    if ctx.format() == OutputFormat::Json {
        return print_json(&conversations);
    }
    for conversation in &conversations {
        println!("{} ({})", conversation.title(locale), conversation.id);
        for turn in conversation.turns() {
            println!("  {}: {}", turn.speaker, turn.text);
        }
    }
    Ok(())
}
