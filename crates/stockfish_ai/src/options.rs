//! Engine strength settings
//!
//! Stockfish only honours `UCI_Elo` inside 1350..=2850 and `Skill Level`
//! inside 0..=20, so every value coming from the outside goes through
//! [`EngineOptions::clamped`] first.

pub const MIN_ELO: u32 = 1350;
pub const MAX_ELO: u32 = 2850;
pub const MAX_SKILL: u8 = 20;

pub const DEFAULT_ELO: u32 = 1350;
pub const DEFAULT_SKILL: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub elo: u32,
    pub skill: u8,
    pub limit_strength: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            elo: DEFAULT_ELO,
            skill: DEFAULT_SKILL,
            limit_strength: true,
        }
    }
}

impl EngineOptions {
    /// Build options from untrusted values, clamping into supported ranges
    pub fn clamped(elo: i64, skill: i64) -> Self {
        Self {
            elo: elo.clamp(MIN_ELO as i64, MAX_ELO as i64) as u32,
            skill: skill.clamp(0, MAX_SKILL as i64) as u8,
            limit_strength: true,
        }
    }

    /// `setoption` lines in the order they are sent
    pub fn setoption_commands(&self) -> Vec<String> {
        vec![
            format!("setoption name Skill Level value {}", self.skill),
            format!(
                "setoption name UCI_LimitStrength value {}",
                self.limit_strength
            ),
            format!("setoption name UCI_Elo value {}", self.elo),
        ]
    }
}
