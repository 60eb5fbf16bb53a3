use crate::discord::guild_ops::is_staff;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::collections::HashMap;

// Category definitions with emojis and order
const CATEGORY_ORDER: &[&str] = &[
    "Gringotts",
    "Spells & Potions",
    "Room of Requirement",
    "Duelling Club",
    "House Cup",
    "Staff",
];

fn get_category_emoji(category: &str) -> &'static str {
    match category {
        "Gringotts" => "💰",
        "Spells & Potions" => "🪄",
        "Room of Requirement" => "🚪",
        "Duelling Club" => "⚔️",
        "House Cup" => "🏆",
        "Staff" => "🛡️",
        _ => "•",
    }
}

struct CommandMetadata {
    category: &'static str,
    priority: i32,
    usage: &'static str,
    staff_only: bool,
}

fn get_command_metadata(name: &str) -> CommandMetadata {
    let (category, priority, usage, staff_only) = match name {
        "balance" => ("Gringotts", 100, "!balance [@member]", false),
        "daily" => ("Gringotts", 90, "!daily", false),
        "pay" => ("Gringotts", 80, "!pay @member <amount>", false),
        "leaderboard" => ("Gringotts", 70, "!leaderboard", false),
        "shop" => ("Spells & Potions", 100, "!shop", false),
        "cast" => ("Spells & Potions", 90, "!cast <spell> @member", false),
        "drink" => ("Spells & Potions", 80, "!drink <potion> [@member]", false),
        "finite" => ("Spells & Potions", 70, "!finite @member [effect]", false),
        "effects" => ("Spells & Potions", 60, "!effects [@member]", false),
        "choose" => ("Room of Requirement", 100, "!choose <1-5>", false),
        "duel" => ("Duelling Club", 100, "!duel @member <wager>", false),
        "accept" => ("Duelling Club", 90, "!accept", false),
        "decline" => ("Duelling Club", 80, "!decline", false),
        "points" => ("House Cup", 100, "!points", false),
        "addpoints" => ("Staff", 100, "!addpoints <house> <amount>", true),
        "resetpoints" => ("Staff", 90, "!resetpoints", true),
        "givegalleons" => ("Staff", 80, "!givegalleons @member <amount>", true),
        "resetgalleons" => ("Staff", 70, "!resetgalleons", true),
        "trigger-game" => ("Staff", 60, "!trigger-game [@member]", true),
        "hedwigmod" => ("Staff", 0, "!hedwigmod", true),
        _ => ("Other", 0, "", false),
    };

    CommandMetadata {
        category,
        priority,
        usage,
        staff_only,
    }
}

/// Show everything Hedwig can do
#[poise::command(prefix_command, slash_command)]
pub async fn hedwighelp(ctx: Context<'_>) -> Result<(), Error> {
    send_guide(ctx, false).await
}

/// Show the staff commands (Prefects & Head of House only)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn hedwigmod(ctx: Context<'_>) -> Result<(), Error> {
    if !is_staff(ctx).await {
        ctx.say("🚫 This guide is for Prefects and Heads of House.")
            .await?;
        return Ok(());
    }
    send_guide(ctx, true).await
}

async fn send_guide(ctx: Context<'_>, staff: bool) -> Result<(), Error> {
    let commands: Vec<(&str, Option<&str>)> = ctx
        .framework()
        .options()
        .commands
        .iter()
        .filter(|c| !c.hide_in_help)
        .map(|c| (c.name.as_str(), c.description.as_deref()))
        .collect();
    let sections = build_sections(&commands, staff);

    let (title, blurb) = if staff {
        ("🛡️ Hedwig Staff Guide", "Commands for Prefects and Heads of House.")
    } else {
        (
            "🦉 Hedwig Command Guide",
            "Every command works with `!` or as a slash command.",
        )
    };

    let mut embed = serenity::CreateEmbed::new()
        .title(title)
        .description(blurb)
        .color(serenity::Colour::from_rgb(116, 0, 1))
        .timestamp(serenity::Timestamp::now());

    for (name, value) in sections {
        embed = embed.field(name, value, false);
    }

    embed = embed.footer(serenity::CreateEmbedFooter::new(
        "Mischief managed? Ask a Prefect.",
    ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Group commands into embed fields, keeping either the member or the staff set.
fn build_sections(commands: &[(&str, Option<&str>)], staff: bool) -> Vec<(String, String)> {
    let mut categories: HashMap<&str, Vec<(i32, String)>> = HashMap::new();

    for (name, description) in commands {
        if matches!(*name, "hedwighelp" | "hedwigmod") {
            continue;
        }

        let metadata = get_command_metadata(name);
        if metadata.staff_only != staff {
            continue;
        }

        let usage = if metadata.usage.is_empty() {
            format!("!{}", name)
        } else {
            metadata.usage.to_string()
        };
        let entry = format!(
            "• `{}` — {}",
            usage,
            description.unwrap_or("No description provided.")
        );

        categories
            .entry(metadata.category)
            .or_default()
            .push((metadata.priority, entry));
    }

    // Sort categories based on defined order, then alphabetically for others
    let mut sorted_categories: Vec<_> = categories.keys().cloned().collect();
    sorted_categories.sort_by(|a, b| {
        let pos_a = CATEGORY_ORDER.iter().position(|&x| x == *a).unwrap_or(999);
        let pos_b = CATEGORY_ORDER.iter().position(|&x| x == *b).unwrap_or(999);
        pos_a.cmp(&pos_b).then(a.cmp(b))
    });

    let mut sections = Vec::new();
    for category in sorted_categories {
        let Some(entries) = categories.get_mut(category) else {
            continue;
        };
        entries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let title = format!("{} {}", get_category_emoji(category), category);
        let formatted: Vec<String> = entries.iter().map(|(_, s)| s.clone()).collect();

        // Chunk entries to avoid hitting 1024 char limit per field
        for (i, chunk) in chunk_entries(&formatted).iter().enumerate() {
            let field_name = if i == 0 {
                title.clone()
            } else {
                format!("{} (cont.)", title)
            };
            sections.push((field_name, chunk.join("\n")));
        }
    }

    sections
}

fn chunk_entries(entries: &[String]) -> Vec<Vec<String>> {
    let mut chunks = Vec::new();
    let mut current_chunk = Vec::new();
    let mut current_length = 0;

    for entry in entries {
        let entry_len = entry.len();
        // Discord field value limit is 1024. We leave a bit of buffer.
        if current_length + entry_len + 1 > 1000 && !current_chunk.is_empty() {
            chunks.push(current_chunk);
            current_chunk = Vec::new();
            current_length = 0;
        }

        current_chunk.push(entry.clone());
        current_length += entry_len + 1;
    }

    if !current_chunk.is_empty() {
        chunks.push(current_chunk);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMANDS: &[(&str, Option<&str>)] = &[
        ("balance", Some("Check your galleons")),
        ("daily", Some("Collect your daily pocket money")),
        ("cast", Some("Cast a spell")),
        ("addpoints", Some("Award house points")),
        ("trigger-game", None),
        ("hedwighelp", Some("Help")),
    ];

    #[test]
    fn test_member_guide_hides_staff_commands() {
        let sections = build_sections(COMMANDS, false);
        let names: Vec<&str> = sections.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["💰 Gringotts", "🪄 Spells & Potions"]);

        let text: String = sections.iter().map(|(_, v)| v.as_str()).collect();
        assert!(!text.contains("addpoints"));
        assert!(!text.contains("hedwighelp"));
        // Higher priority first within a category
        assert!(text.find("!balance").unwrap() < text.find("!daily").unwrap());
    }

    #[test]
    fn test_staff_guide_only_staff_commands() {
        let sections = build_sections(COMMANDS, true);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].1.contains("!addpoints <house> <amount>"));
        assert!(sections[0].1.contains("No description provided."));
    }

    #[test]
    fn test_chunk_entries_splits_long_sections() {
        let entries: Vec<String> = (0..30).map(|i| format!("{:0>60}", i)).collect();
        let chunks = chunk_entries(&entries);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), 30);
        for chunk in chunks {
            assert!(chunk.iter().map(|e| e.len() + 1).sum::<usize>() <= 1000);
        }
    }
}
