use anyhow::Result;
use colored::Colorize;
use std::io::Write;

use crate::runner::RunSummary;

pub fn generate_console_report(out: &mut dyn Write, summary: &RunSummary) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Season Run Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    writeln!(out, "Seed: {}", summary.seed)?;
    writeln!(
        out,
        "Season {}: {} days, {} games{}",
        summary.season,
        summary.days_played,
        summary.games_played,
        if summary.season_complete {
            " (complete)"
        } else {
            ""
        }
    )?;
    writeln!(out, "Final generation: {}", summary.final_generation)?;
    writeln!(out, "Elapsed: {}ms", summary.elapsed_ms)?;
    writeln!(out)?;

    writeln!(out, "{}", "🗄️  Cache".bright_yellow().bold())?;
    writeln!(out, "{}", "--------".yellow())?;
    let stats = &summary.cache;
    writeln!(out, "View reads: {}", summary.view_reads)?;
    writeln!(out, "Hits: {}", stats.hits.to_string().green())?;
    writeln!(out, "Misses: {}", stats.misses.to_string().red())?;
    writeln!(out, "Stale drops: {}", stats.stale_drops)?;
    writeln!(out, "Writes: {}", stats.writes)?;
    writeln!(
        out,
        "Evictions: {} ({} by age sweep)",
        stats.evictions, summary.swept
    )?;
    writeln!(out, "Hit rate: {:.1}%", summary.hit_rate * 100.0)?;
    if let Some(race) = &summary.race {
        writeln!(
            out,
            "Interleaved reads: {} ({} stored under the newer generation)",
            race.attempts,
            race.stamped_after_bump.to_string().yellow()
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", "🏆 Standings".bright_green().bold())?;
    writeln!(out, "{}", "------------".green())?;
    for team in &summary.top_teams {
        writeln!(
            out,
            "  {:<4} {:>3}-{:<3} {}  GB {:>4.1}  {}",
            team.abbreviation.bold(),
            team.wins,
            team.losses,
            team.pct,
            team.games_behind,
            team.division
        )?;
    }
    writeln!(out)?;

    writeln!(out, "{}", "⚾ Leaders".bright_blue().bold())?;
    writeln!(out, "{}", "----------".blue())?;
    for leader in &summary.leaders {
        writeln!(
            out,
            "  {:<4} {:>2}. {:<20} {:<4} {}",
            leader.stat.as_str().to_uppercase(),
            leader.rank,
            leader.name,
            leader.team,
            leader.value
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, summary: &RunSummary) -> Result<()> {
    let json_output = serde_json::to_string_pretty(summary)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, summary: &RunSummary) -> Result<()> {
    writeln!(out, "# Dugout Season Run\n")?;
    writeln!(out, "- Seed: `{}`", summary.seed)?;
    writeln!(out, "- Season: {}", summary.season)?;
    writeln!(out, "- Days played: {}", summary.days_played)?;
    writeln!(out, "- Games played: {}", summary.games_played)?;
    writeln!(out, "- Final generation: {}", summary.final_generation)?;
    writeln!(out)?;

    writeln!(out, "## Cache\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|--------|-------|")?;
    let stats = &summary.cache;
    writeln!(out, "| View reads | {} |", summary.view_reads)?;
    writeln!(out, "| Hits | {} |", stats.hits)?;
    writeln!(out, "| Misses | {} |", stats.misses)?;
    writeln!(out, "| Stale drops | {} |", stats.stale_drops)?;
    writeln!(out, "| Writes | {} |", stats.writes)?;
    writeln!(out, "| Evictions | {} |", stats.evictions)?;
    writeln!(out, "| Hit rate | {:.1}% |", summary.hit_rate * 100.0)?;
    if let Some(race) = &summary.race {
        writeln!(
            out,
            "| Interleaved reads | {} ({} stamped after bump) |",
            race.attempts, race.stamped_after_bump
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Standings\n")?;
    writeln!(out, "| Team | W | L | Pct | GB |")?;
    writeln!(out, "|------|---|---|-----|----|")?;
    for team in &summary.top_teams {
        writeln!(
            out,
            "| {} | {} | {} | {} | {:.1} |",
            team.abbreviation, team.wins, team.losses, team.pct, team.games_behind
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Leaders\n")?;
    writeln!(out, "| Stat | Rank | Player | Team | Value |")?;
    writeln!(out, "|------|------|--------|------|-------|")?;
    for leader in &summary.leaders {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            leader.stat, leader.rank, leader.name, leader.team, leader.value
        )?;
    }
    Ok(())
}
