//! Styling helpers for terminal output.
//!
//! The [`GameStyle`] trait applies ANSI styling via the `colored` crate. It is implemented for
//! `&str` and `String` so narration lines and literals can be styled directly.

use colored::{ColoredString, Colorize};

/// Convenience trait for applying color and style to text output.
pub trait GameStyle {
    fn title_style(&self) -> ColoredString;
    fn room_style(&self) -> ColoredString;
    fn description_style(&self) -> ColoredString;
    fn narration_style(&self) -> ColoredString;
    fn combat_style(&self) -> ColoredString;
    fn damage_style(&self) -> ColoredString;
    fn victory_style(&self) -> ColoredString;
    fn defeat_style(&self) -> ColoredString;
    fn exit_style(&self) -> ColoredString;
    fn status_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn engine_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
}

impl GameStyle for &str {
    fn title_style(&self) -> ColoredString {
        self.bright_yellow().bold().underline()
    }
    fn room_style(&self) -> ColoredString {
        self.truecolor(223, 77, 10).underline()
    }
    fn description_style(&self) -> ColoredString {
        self.italic().truecolor(102, 208, 250)
    }
    fn narration_style(&self) -> ColoredString {
        self.normal()
    }
    fn combat_style(&self) -> ColoredString {
        self.bold().truecolor(230, 80, 80)
    }
    fn damage_style(&self) -> ColoredString {
        self.truecolor(200, 50, 50)
    }
    fn victory_style(&self) -> ColoredString {
        self.bold().truecolor(110, 220, 110)
    }
    fn defeat_style(&self) -> ColoredString {
        self.bold().truecolor(230, 30, 30)
    }
    fn exit_style(&self) -> ColoredString {
        self.italic().truecolor(220, 180, 40)
    }
    fn status_style(&self) -> ColoredString {
        self.truecolor(150, 230, 30)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(75, 180, 255)
    }
    fn engine_style(&self) -> ColoredString {
        self.dimmed().truecolor(75, 80, 75)
    }
    fn error_style(&self) -> ColoredString {
        self.truecolor(230, 30, 30)
    }
}

impl GameStyle for String {
    fn title_style(&self) -> ColoredString {
        self.as_str().title_style()
    }
    fn room_style(&self) -> ColoredString {
        self.as_str().room_style()
    }
    fn description_style(&self) -> ColoredString {
        self.as_str().description_style()
    }
    fn narration_style(&self) -> ColoredString {
        self.as_str().narration_style()
    }
    fn combat_style(&self) -> ColoredString {
        self.as_str().combat_style()
    }
    fn damage_style(&self) -> ColoredString {
        self.as_str().damage_style()
    }
    fn victory_style(&self) -> ColoredString {
        self.as_str().victory_style()
    }
    fn defeat_style(&self) -> ColoredString {
        self.as_str().defeat_style()
    }
    fn exit_style(&self) -> ColoredString {
        self.as_str().exit_style()
    }
    fn status_style(&self) -> ColoredString {
        self.as_str().status_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn engine_style(&self) -> ColoredString {
        self.as_str().engine_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
}

/// Pick a style for one line of session output based on what it reports.
pub fn style_line(line: &str) -> ColoredString {
    if line.starts_with("Victory!") || line.contains("delve is complete") {
        line.victory_style()
    } else if line.starts_with("The party has fallen") || line.ends_with("is defeated.") {
        line.defeat_style()
    } else if line.starts_with("Combat begins") || line.starts_with("Initiative:") {
        line.combat_style()
    } else if line.starts_with("Exits:") {
        line.exit_style()
    } else if line.contains(" damage from being ") {
        line.damage_style()
    } else if line.starts_with("You stand") || line.starts_with("This room") || line.starts_with("You have already") {
        line.description_style()
    } else {
        line.narration_style()
    }
}
