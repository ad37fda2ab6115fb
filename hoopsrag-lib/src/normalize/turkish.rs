use crate::normalize::{Language, Template};
use crate::record::GameLine;

/// Turkish sentence template, the language of the source dataset.
///
/// Output:
/// "Jayson Tatum (BOS), 2024-01-01 tarihinde NYK takımına karşı oynanan maçta
/// 35 dakika süre aldı. Maçı 30 sayı, 8 ribaund, 5 asist, 1 top çalma ve 1 blok
/// ile tamamladı. Saha içi isabet oranı 50.0% idi."
pub struct TurkishTemplate;

impl Template for TurkishTemplate {
    fn name(&self) -> &str {
        "turkish"
    }

    fn language(&self) -> Language {
        Language::Turkish
    }

    fn render(&self, line: &GameLine) -> String {
        format!(
            "{player} ({team}), {date} tarihinde {opp} takımına karşı oynanan maçta \
             {mp} dakika süre aldı. Maçı {pts} sayı, {trb} ribaund, {ast} asist, \
             {stl} top çalma ve {blk} blok ile tamamladı. Saha içi isabet oranı {fg} idi.",
            player = line.player,
            team = line.team,
            date = line.date,
            opp = line.opponent,
            mp = line.minutes,
            pts = line.points,
            trb = line.rebounds,
            ast = line.assists,
            stl = line.steals,
            blk = line.blocks,
            fg = line.field_goal_percent(),
        )
    }
}
