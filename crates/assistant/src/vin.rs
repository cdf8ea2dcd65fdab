use std::fmt;

pub const VIN_LENGTH: usize = 17;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VinIssue {
    WrongLength(usize),
    InvalidCharacter(char),
    /// I, O and Q are excluded to avoid confusion with 1 and 0.
    ForbiddenLetter(char),
}

impl fmt::Display for VinIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VinIssue::WrongLength(len) => {
                write!(f, "VIN has {len} characters, expected {VIN_LENGTH}")
            }
            VinIssue::InvalidCharacter(c) => write!(f, "VIN contains invalid character {c:?}"),
            VinIssue::ForbiddenLetter(c) => write!(f, "VIN may not contain the letter {c}"),
        }
    }
}

/// Plausibility check only; the registry remains the authority.
pub fn check_vin(value: &str) -> Result<(), VinIssue> {
    let vin = value.trim().to_ascii_uppercase();
    let len = vin.chars().count();
    if len != VIN_LENGTH {
        return Err(VinIssue::WrongLength(len));
    }
    for c in vin.chars() {
        if !c.is_ascii_alphanumeric() {
            return Err(VinIssue::InvalidCharacter(c));
        }
        if matches!(c, 'I' | 'O' | 'Q') {
            return Err(VinIssue::ForbiddenLetter(c));
        }
    }
    Ok(())
}
