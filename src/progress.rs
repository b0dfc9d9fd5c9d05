use std::fmt;

pub const DEFAULT_GOAL: u64 = 1000;

/// Signups a city needs before it unlocks. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Goal(u64);

impl Goal {
    pub const fn new(value: u64) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Self(value))
        }
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Default for Goal {
    fn default() -> Self {
        Self(DEFAULT_GOAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgressTier {
    Early,
    Halfway,
    Imminent,
    Launched,
}

impl ProgressTier {
    /// Lower bounds are inclusive: `count == 0.9 * goal` is already imminent.
    pub fn for_count(count: u64, goal: Goal) -> Self {
        let count = u128::from(count);
        let goal = u128::from(goal.get());

        if count >= goal {
            Self::Launched
        } else if count * 10 >= goal * 9 {
            Self::Imminent
        } else if count * 2 >= goal {
            Self::Halfway
        } else {
            Self::Early
        }
    }

    pub const fn is_close(self) -> bool {
        matches!(self, Self::Launched | Self::Imminent)
    }

    pub fn message(self, remaining: u64) -> String {
        let remaining = format_count(remaining);
        match self {
            Self::Launched => "🎉 This city is ready to launch!".to_string(),
            Self::Imminent => format!("🔥 Only {remaining} more signups to unlock!"),
            Self::Halfway => format!("Halfway there! {remaining} more to go."),
            Self::Early => format!("{remaining} signups needed to unlock this city."),
        }
    }
}

impl fmt::Display for ProgressTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Early => "early",
            Self::Halfway => "halfway",
            Self::Imminent => "imminent",
            Self::Launched => "launched",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub count: u64,
    pub goal: Goal,
    pub percentage: u8,
    pub tier: ProgressTier,
    pub remaining: u64,
}

impl Progress {
    pub fn message(&self) -> String {
        self.tier.message(self.remaining)
    }
}

pub fn classify(count: u64, goal: Goal) -> Progress {
    Progress {
        count,
        goal,
        percentage: percentage(count, goal),
        tier: ProgressTier::for_count(count, goal),
        remaining: goal.get().saturating_sub(count),
    }
}

/// `round(100 * count / goal)`, capped at 100.
fn percentage(count: u64, goal: Goal) -> u8 {
    let count = u128::from(count);
    let goal = u128::from(goal.get());
    let rounded = (count * 200 + goal) / (goal * 2);
    rounded.min(100) as u8
}

/// Renders a count with comma thousands separators, e.g. `12,345`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut output = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            output.push(',');
        }
        output.push(digit);
    }

    output
}
