use serde::Serialize;

/// Characters that count as "special" for both the password rule and the
/// strength meter.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

pub(crate) fn contains_special(password: &str) -> bool {
    password.chars().any(|c| SPECIAL_CHARACTERS.contains(c))
}

pub(crate) fn contains_digit(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_digit())
}

/// Informational strength meter shown under the new-password input. Never
/// blocks advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    Weak,
    Fair,
    Good,
    Strong,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        Self::from_score(strength_score(password))
    }

    pub const fn from_score(score: u8) -> Self {
        match score {
            0 => Self::Weak,
            1 => Self::Fair,
            2 => Self::Good,
            _ => Self::Strong,
        }
    }

    pub const fn score(self) -> u8 {
        match self {
            Self::Weak => 0,
            Self::Fair => 1,
            Self::Good => 2,
            Self::Strong => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Fair => "Fair",
            Self::Good => "Good",
            Self::Strong => "Strong",
        }
    }
}

/// One point each for length, a special character, a digit and an uppercase
/// letter, capped at 3.
pub fn strength_score(password: &str) -> u8 {
    let checks = [
        password.chars().count() >= 8,
        contains_special(password),
        contains_digit(password),
        password.chars().any(|c| c.is_ascii_uppercase()),
    ];
    let points = checks.iter().filter(|passed| **passed).count() as u8;
    points.min(3)
}
