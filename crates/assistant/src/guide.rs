//! Static field reference: pre-test checklists and the status tags printed on
//! compliance notices.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Opacity (smoke) test.
    Ovi,
    Obd,
}

impl TestKind {
    pub const ALL: [TestKind; 2] = [TestKind::Ovi, TestKind::Obd];

    pub const fn as_str(self) -> &'static str {
        match self {
            TestKind::Ovi => "ovi",
            TestKind::Obd => "obd",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ovi" | "smoke" | "opacity" => Ok(TestKind::Ovi),
            "obd" => Ok(TestKind::Obd),
            other => Err(format!("unknown test '{other}' (expected ovi or obd)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checklist {
    pub test: TestKind,
    pub label: &'static str,
    pub items: &'static [&'static str],
}

static OVI_CHECKLIST: Checklist = Checklist {
    test: TestKind::Ovi,
    label: "OVI (Smoke)",
    items: &[
        "Warm up engine to operating temp (>185°F)",
        "Inspect exhaust system for leaks",
        "Check oil & coolant levels",
        "Disable exhaust brake/retarder",
    ],
};

static OBD_CHECKLIST: Checklist = Checklist {
    test: TestKind::Obd,
    label: "OBD",
    items: &[
        "Verify MIL (Check Engine Light) is working",
        "Ensure no active diagnostic codes",
        "Locate OBD port (9-pin or 16-pin)",
        "Drive cycle complete (if codes cleared recently)",
    ],
};

pub fn checklist(test: TestKind) -> &'static Checklist {
    match test {
        TestKind::Ovi => &OVI_CHECKLIST,
        TestKind::Obd => &OBD_CHECKLIST,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum StatusTag {
    NonCompliance,
    Advisory,
    Inconsistency,
}

impl StatusTag {
    pub const ALL: [StatusTag; 3] = [
        StatusTag::NonCompliance,
        StatusTag::Advisory,
        StatusTag::Inconsistency,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StatusTag::NonCompliance => "NON-COMPLIANCE",
            StatusTag::Advisory => "ADVISORY",
            StatusTag::Inconsistency => "INCONSISTENCY",
        }
    }

    pub const fn meaning(self) -> &'static str {
        match self {
            StatusTag::NonCompliance => "Missing Fee or missing current OBD/Smoke test.",
            StatusTag::Advisory => "Less than 60 days to registration freeze.",
            StatusTag::Inconsistency => "Engine Tag Data (EFN) mismatch found by auditor.",
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusTag {
    type Err = String;

    /// Case, spaces, dashes and underscores are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match folded.as_str() {
            "NONCOMPLIANCE" => Ok(StatusTag::NonCompliance),
            "ADVISORY" => Ok(StatusTag::Advisory),
            "INCONSISTENCY" => Ok(StatusTag::Inconsistency),
            _ => Err(format!(
                "unknown status tag '{}' (expected non-compliance, advisory or inconsistency)",
                s.trim()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn each_test_has_four_steps() {
        for test in TestKind::ALL {
            let list = checklist(test);
            assert_eq!(list.test, test);
            assert_eq!(list.items.len(), 4);
        }
        assert_eq!(checklist(TestKind::Ovi).label, "OVI (Smoke)");
        assert!(checklist(TestKind::Obd).items[0].contains("MIL"));
    }

    #[test]
    fn test_kind_accepts_smoke_alias() {
        assert_eq!("Smoke".parse::<TestKind>().unwrap(), TestKind::Ovi);
        assert_eq!(" OBD ".parse::<TestKind>().unwrap(), TestKind::Obd);
        assert!("emissions".parse::<TestKind>().is_err());
    }

    #[test]
    fn status_tags_parse_loosely() {
        for raw in ["NON-COMPLIANCE", "non compliance", "non_compliance", "NonCompliance"] {
            assert_eq!(raw.parse::<StatusTag>().unwrap(), StatusTag::NonCompliance, "{raw}");
        }
        assert_eq!("advisory".parse::<StatusTag>().unwrap(), StatusTag::Advisory);
        assert!("".parse::<StatusTag>().is_err());
        assert!("warning".parse::<StatusTag>().is_err());
    }

    #[test]
    fn status_tags_serialize_as_printed() {
        let json = serde_json::to_value(StatusTag::ALL).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["NON-COMPLIANCE", "ADVISORY", "INCONSISTENCY"])
        );
        assert!(StatusTag::Advisory.meaning().contains("60 days"));
    }
}
