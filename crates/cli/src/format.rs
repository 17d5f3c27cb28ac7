//! Chat-style rendering of query results.
//!
//! Pure functions: structured values in, message text out. Numbers use `.`
//! as the thousands separator, matching how the alliance reads them.

use std::fmt::Write;

use kvk_recon::{AggregateSummary, QueryError, ReconSummary, ScoredEntity};

/// Round to an integer and group thousands with `.`: `1234567.6` → `1.234.568`.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Whole-number percentage, e.g. `87%`.
pub fn whole_pct(pct: f64) -> String {
    format!("{}%", group_thousands(pct))
}

fn display_name(entity: &ScoredEntity) -> &str {
    if entity.entity.name.is_empty() {
        "(unnamed)"
    } else {
        &entity.entity.name
    }
}

pub fn stats_reply(s: &ScoredEntity) -> String {
    let e = &s.entity;
    let lines = [
        format!("📊 **Player Statistics:** {} (ID: {})", display_name(s), e.id),
        format!("🔹 **Matchmaking Power:** {}", group_thousands(e.before.power)),
        format!("🔹 **Power Change:** {}", group_thousands(e.power_change)),
        format!("🔹 **Kill Points (Gained):** {}", group_thousands(e.kills_change)),
        format!("🔹 **Tier 4 Kills (Gained):** {}", group_thousands(e.tier4_kills_change)),
        format!("🔹 **Tier 5 Kills (Gained):** {}", group_thousands(e.tier5_kills_change)),
        format!("🔹 **Total Kills (T4 + T5):** {}", group_thousands(e.total_kills_change())),
        format!("🔹 **Required Kills:** {}", group_thousands(e.requirement.required_kills)),
        format!("🔹 **Kill Progress (%):** {}", whole_pct(s.kill_progress_pct)),
        format!("🔹 **Deaths (Gained):** {}", group_thousands(e.deads_change)),
        format!("🔹 **Required Deaths:** {}", group_thousands(e.requirement.required_deaths)),
        format!("🔹 **Death Progress (%):** {}", whole_pct(s.death_progress_pct)),
        format!("🔹 **DKP:** {}", group_thousands(s.dkp_score)),
        format!("🔹 **DKP Rank:** #{}", s.rank),
    ];
    lines.join("\n")
}

pub fn overview_reply(o: &AggregateSummary) -> String {
    format!(
        "📊 Overview ({} players):\n\
         Average kill points change: {:.2}\n\
         Average deaths change: {:.2}\n\
         Average kills completion: {:.2}%\n\
         Average deaths completion: {:.2}%\n\
         Average DKP: {:.2}\n\
         Total DKP: {}",
        o.entities,
        o.avg_kills_change,
        o.avg_deads_change,
        o.avg_kills_completion_pct,
        o.avg_deaths_completion_pct,
        o.avg_dkp_score,
        group_thousands(o.total_dkp_score),
    )
}

pub fn unmet_reply(unmet: &[&ScoredEntity]) -> String {
    if unmet.is_empty() {
        return "✅ All players have met their requirements!".to_string();
    }
    let mut out = String::from("📋 Players who have not met their requirements:");
    for s in unmet {
        let _ = write!(
            out,
            "\n{} (ID: {}) - Kills: {:.2}%, Deaths: {:.2}%",
            display_name(s),
            s.entity.id,
            s.entity.kills_completion_pct,
            s.entity.deaths_completion_pct,
        );
    }
    out
}

pub fn top_reply(top: &[ScoredEntity]) -> String {
    if top.is_empty() {
        return "The report has no players.".to_string();
    }
    let mut out = format!("🏆 Top {} by DKP:", top.len());
    for s in top {
        let _ = write!(
            out,
            "\n#{} {} (ID: {}) - DKP: {}",
            s.rank,
            display_name(s),
            s.entity.id,
            group_thousands(s.dkp_score),
        );
    }
    out
}

pub fn help_reply(prefix: &str) -> String {
    format!(
        "Available commands:\n\
         {p}stats <Governor ID> - statistics for one player\n\
         {p}overview - averages over all players\n\
         {p}requirements (or {p}req) - players below their requirements\n\
         {p}top [n] - the n highest DKP scores\n\
         {p}reload - rebuild the report from the source files\n\
         {p}help (or {p}commands) - this list",
        p = prefix
    )
}

pub fn query_error_reply(err: &QueryError, prefix: &str) -> String {
    match err {
        QueryError::NoReport => {
            format!("No report has been published yet. Use {prefix}reload to build one.")
        }
        QueryError::NotFound { id } => format!("Player with ID {id} not found."),
        QueryError::EmptyPopulation => "The report has no players.".to_string(),
    }
}

/// One-line run summary for stderr and the chat `reload` reply.
pub fn summary_line(version: u64, s: &ReconSummary) -> String {
    format!(
        "report v{version}: {} players reconciled ({} excluded, {} duplicate rows dropped)",
        s.reconciled, s.excluded, s.duplicates
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvk_recon::{Metrics, ReconciledEntity, Requirement};

    fn scored() -> ScoredEntity {
        let entity = ReconciledEntity::new(
            "1001".into(),
            "Alice".into(),
            Metrics { power: 52_000_000.0, kill_points: 1000.0, deaths: 10.0, tier4_kills: 400.0, tier5_kills: 200.0 },
            Metrics { power: 51_000_000.0, kill_points: 1_501_000.0, deaths: 12.0, tier4_kills: 420.0, tier5_kills: 230.0 },
            Requirement { required_kills: 400.0, required_deaths: 5.0 },
        );
        ScoredEntity {
            entity,
            dkp_score: 410.0,
            rank: 2,
            kill_progress_pct: 12.5,
            death_progress_pct: 40.0,
        }
    }

    #[test]
    fn thousands_use_dots() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1.000");
        assert_eq!(group_thousands(1_234_567.6), "1.234.568");
        assert_eq!(group_thousands(-1_000_000.0), "-1.000.000");
        assert_eq!(group_thousands(-0.4), "0");
    }

    #[test]
    fn stats_reply_lines() {
        let text = stats_reply(&scored());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 14);
        assert_eq!(lines[0], "📊 **Player Statistics:** Alice (ID: 1001)");
        assert_eq!(lines[1], "🔹 **Matchmaking Power:** 52.000.000");
        assert_eq!(lines[2], "🔹 **Power Change:** -1.000.000");
        assert_eq!(lines[3], "🔹 **Kill Points (Gained):** 1.500.000");
        assert_eq!(lines[6], "🔹 **Total Kills (T4 + T5):** 50");
        assert_eq!(lines[8], "🔹 **Kill Progress (%):** 13%");
        assert_eq!(lines[11], "🔹 **Death Progress (%):** 40%");
        assert_eq!(lines[13], "🔹 **DKP Rank:** #2");
    }

    #[test]
    fn overview_has_two_decimals() {
        let o = AggregateSummary {
            entities: 3,
            avg_kills_change: 1100.0 / 3.0,
            avg_deads_change: 32.0 / 3.0,
            avg_kills_completion_pct: 505.0 / 3.0,
            avg_deaths_completion_pct: 370.0 / 3.0,
            avg_dkp_score: 2860.0 / 3.0,
            total_dkp_score: 2860.0,
        };
        let text = overview_reply(&o);
        assert!(text.starts_with("📊 Overview (3 players):"));
        assert!(text.contains("Average kill points change: 366.67"));
        assert!(text.contains("Average kills completion: 168.33%"));
        assert!(text.ends_with("Total DKP: 2.860"));
    }

    #[test]
    fn unmet_lists_each_player() {
        let s = scored();
        let text = unmet_reply(&[&s]);
        assert_eq!(
            text,
            "📋 Players who have not met their requirements:\n\
             Alice (ID: 1001) - Kills: 375250.00%, Deaths: 240.00%"
        );
        assert!(unmet_reply(&[]).starts_with("✅"));
    }

    #[test]
    fn top_and_help() {
        let text = top_reply(&[scored()]);
        assert_eq!(text, "🏆 Top 1 by DKP:\n#2 Alice (ID: 1001) - DKP: 410");
        assert!(help_reply("?").contains("?stats <Governor ID>"));
    }
}
