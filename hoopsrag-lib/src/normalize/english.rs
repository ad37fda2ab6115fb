use crate::normalize::{Language, Template};
use crate::record::GameLine;

/// English sentence template
pub struct EnglishTemplate;

impl Template for EnglishTemplate {
    fn name(&self) -> &str {
        "english"
    }

    fn language(&self) -> Language {
        Language::English
    }

    fn render(&self, line: &GameLine) -> String {
        format!(
            "{player} ({team}) played {mp} minutes against {opp} on {date} \
             and finished with {pts} points, {trb} rebounds, {ast} assists, \
             {stl} steals and {blk} blocks, shooting {fg} from the field.",
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
