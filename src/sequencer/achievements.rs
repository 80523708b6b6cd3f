// Badges and the challenge prompts. Pure bookkeeping; showing a badge is up to
// whoever renders the display state.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Badge {
    FirstNote,
    Emotion,
    Challenge,
}

impl Badge {
    pub const ALL: [Badge; 3] = [Badge::FirstNote, Badge::Emotion, Badge::Challenge];

    pub fn label(self) -> &'static str {
        match self {
            Badge::FirstNote => "first note",
            Badge::Emotion => "emotion",
            Badge::Challenge => "challenge",
        }
    }
}

pub const CHALLENGES: [&str; 5] = [
    "Create a melody with exactly 8 notes",
    "Make a pattern that alternates between columns",
    "Create a melody using only the top 4 rows",
    "Make a pattern that spells your name in Morse code",
    "Create a melody that gets progressively faster",
];

#[derive(Clone, Debug, Default)]
pub struct AchievementTracker {
    unlocked: [bool; Badge::ALL.len()],
    next_challenge: usize,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unlocked(&self, badge: Badge) -> bool {
        self.unlocked[badge as usize]
    }

    /// Returns true only on the call that actually unlocks the badge.
    pub fn unlock(&mut self, badge: Badge) -> bool {
        let slot = &mut self.unlocked[badge as usize];
        let fresh = !*slot;
        *slot = true;
        fresh
    }

    /// Called after any grid edit with the new active-cell count.
    pub fn record_grid(&mut self, active_cells: usize) -> Option<Badge> {
        (active_cells > 0 && self.unlock(Badge::FirstNote)).then_some(Badge::FirstNote)
    }

    /// Hands out challenges in rotation and unlocks the challenge badge.
    pub fn next_challenge(&mut self) -> &'static str {
        let text = CHALLENGES[self.next_challenge % CHALLENGES.len()];
        self.next_challenge += 1;
        self.unlock(Badge::Challenge);
        text
    }

    pub fn badges(&self) -> Vec<(Badge, bool)> {
        Badge::ALL.iter().map(|&b| (b, self.is_unlocked(b))).collect()
    }
}
