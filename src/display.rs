use colored::*;

use crate::aggregate::{AnnotatedDraw, AnnotatedSlot, Entrant};
use crate::domain::{PresetInfo, RunReport};
use crate::rating::{Component, MatchPrediction, PlayerRating};

const RULE_WIDTH: usize = 78;

/// Ranking table with a rule under every drop-off
pub fn ranking_table(report: &RunReport) -> String {
    let mut lines = Vec::new();
    let aggregate = &report.aggregate;

    lines.push(format!(
        "{} {} trials, seed {}, sorted by {} ({})",
        "Scorito ranking:".bright_white().bold(),
        aggregate.trials,
        aggregate.seed,
        report.sort_by.to_string().cyan(),
        report.sort_direction
    ));
    if aggregate.low_trial_count {
        lines.push("Low trial count, estimates are noisy".yellow().to_string());
    }
    lines.push("═".repeat(RULE_WIDTH).cyan().to_string());
    lines.push(format!(
        "{:>3}  {:<24} {:>4} {:>9} {:>8} {:>8} {:>7} {:>7}",
        "#", "Player", "Tier", "Expected", "Std", "RiskAdj", "Win%", "Path"
    ));

    for (pos, m) in report.ranking.iter().enumerate() {
        let path = m
            .path_strength
            .map_or_else(|| "-".to_string(), |p| format!("{p:.0}"));
        lines.push(format!(
            "{:>3}  {:<24} {:>4} {:>9} {:>8.1} {:>8.2} {:>6.1}% {:>7}",
            pos + 1,
            m.name,
            m.tier,
            format!("{:.1}", m.expected_points).green(),
            m.points_std,
            m.risk_adj_value,
            m.win_probability * 100.0,
            path
        ));
        if report.drop_offs.contains(&pos) {
            lines.push("─".repeat(RULE_WIDTH).bright_black().to_string());
        }
    }
    lines.join("\n")
}

/// Most likely bracket, one match per line
pub fn bracket_text(draw: &AnnotatedDraw) -> String {
    let mut lines = Vec::new();
    for round in &draw.rounds {
        lines.push(format!("{}", round.to_string().bright_white().bold()));
        for node in draw.nodes.iter().filter(|n| n.round == *round) {
            lines.push(format!(
                "  {} vs {}  → {}",
                slot_text(&node.slots[0]),
                slot_text(&node.slots[1]),
                entrant_text(&node.winner).green()
            ));
        }
    }
    let champion = draw
        .nodes
        .last()
        .map(|n| entrant_text(&n.winner))
        .unwrap_or_else(|| "-".to_string());
    lines.push(format!("{} {}", "Champion:".bright_white().bold(), champion.yellow()));
    lines.join("\n")
}

pub fn matchup_text(a: &PlayerRating, b: &PlayerRating, prediction: &MatchPrediction) -> String {
    let mut lines = vec![
        format!(
            "{} ({:.0}) {} vs {} ({:.0}) {}",
            a.name.bright_white().bold(),
            prediction.rating_a,
            percent(prediction.player_a_win_probability).green(),
            b.name.bright_white().bold(),
            prediction.rating_b,
            percent(prediction.player_b_win_probability).green()
        ),
        "─".repeat(RULE_WIDTH).bright_black().to_string(),
    ];
    for factor in &prediction.factors {
        let value = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.0}"));
        lines.push(format!(
            "{:<16} {:>6} × {:.2}  vs {:>6} × {:.2}  {:>+8.4}",
            factor.name,
            value(factor.player_a_value),
            factor.player_a_weight,
            value(factor.player_b_value),
            factor.player_b_weight,
            factor.contribution
        ));
    }
    lines.join("\n")
}

pub fn presets_text(presets: &[PresetInfo]) -> String {
    presets
        .iter()
        .map(|p| {
            let weights = Component::ALL
                .iter()
                .map(|c| format!("{:.2}", p.weights.weight(*c)))
                .collect::<Vec<_>>()
                .join("/");
            format!(
                "{:<10} {}  form {:.1}±{:.0}  {}",
                p.name.yellow(),
                weights,
                p.weights.form_scale(),
                p.weights.form_cap(),
                p.description.bright_black()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn slot_text(slot: &AnnotatedSlot) -> String {
    match slot.win_probability {
        Some(p) => format!("{} ({})", entrant_text(&slot.entrant), percent(p)),
        None => entrant_text(&slot.entrant),
    }
}

fn entrant_text(entrant: &Entrant) -> String {
    match entrant {
        Entrant::Player { name, .. } => name.clone(),
        Entrant::Bye => "bye".to_string(),
        Entrant::Tbd => "TBD".to_string(),
    }
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AnnotatedNode, most_likely_path};
    use crate::bracket::{RoundLabel, Slot, build_bracket};
    use crate::config::settings::EngineSettings;
    use crate::rating::{MatchModel, Tier, predict};
    use crate::simulation::Field;

    #[test]
    fn test_bracket_text_names_champion() {
        colored::control::set_override(false);
        let tree = build_bracket(&[Slot::Player(1), Slot::Player(2), Slot::Player(3), Slot::Bye]).unwrap();
        let players = vec![
            PlayerRating::new(1, "Alcaraz", Tier::A).with_overall(2100.0),
            PlayerRating::new(2, "Ruud", Tier::B).with_overall(1900.0),
            PlayerRating::new(3, "Fils", Tier::C).with_overall(1800.0),
        ];
        let field = Field::new(&tree, &players, &MatchModel::default(), &EngineSettings::default());
        let text = bracket_text(&most_likely_path(&tree, &field));

        assert!(text.contains("Fils vs bye  → Fils"));
        assert!(text.ends_with("Champion: Alcaraz"));
    }

    #[test]
    fn test_unresolved_final_has_no_champion_name() {
        colored::control::set_override(false);
        let draw = AnnotatedDraw {
            rounds: vec![RoundLabel::F],
            nodes: vec![AnnotatedNode {
                id: 0,
                external_id: None,
                round: RoundLabel::F,
                index: 0,
                slots: [
                    AnnotatedSlot {
                        entrant: Entrant::Tbd,
                        win_probability: None,
                    },
                    AnnotatedSlot {
                        entrant: Entrant::Bye,
                        win_probability: None,
                    },
                ],
                winner: Entrant::Tbd,
            }],
            champion: None,
        };
        assert!(bracket_text(&draw).ends_with("Champion: TBD"));
    }

    #[test]
    fn test_matchup_text_lists_factors() {
        colored::control::set_override(false);
        let a = PlayerRating::new(1, "Sinner", Tier::A).with_overall(2000.0);
        let b = PlayerRating::new(2, "Draper", Tier::B).with_overall(1800.0);
        let prediction = predict(&a, &b, &MatchModel::default());
        let text = matchup_text(&a, &b, &prediction);
        assert!(text.starts_with("Sinner (2000)"));
        assert!(text.contains("Overall Elo"));
    }

    #[test]
    fn test_presets_text_lists_weights() {
        colored::control::set_override(false);
        let presets = crate::preset_listing().unwrap();
        let text = presets_text(&presets);
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("0.25/0.15/0.50/0.10"));
    }
}
