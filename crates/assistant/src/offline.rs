//! Canned answers used when the model cannot be reached.

pub const DISPATCH_PHONE: &str = "617-359-6953";

struct Entry {
    keywords: &'static [&'static str],
    answer: &'static str,
}

const KNOWLEDGE_BASE: &[Entry] = &[
    Entry {
        keywords: &["blocked", "hold", "registration", "dmv", "renew"],
        answer: "🔒 **Why is my registration blocked?**\n\nCommon reasons:\n1. **Unpaid State Fee:** You must pay the $30 annual compliance fee per vehicle at https://cleantruckcheck.arb.ca.gov/.\n2. **Missing Test:** You need a passing Smoke/OBD test submitted within 90 days of your registration date.",
    },
    Entry {
        keywords: &["deadline", "when", "due", "date", "frequency"],
        answer: "📅 **Testing Deadlines:**\n\n• **2025-2026:** Most vehicles need to pass a test **Twice a Year**.\n• **2027+:** Increases to **4 times a year**.",
    },
];

const GENERIC_ANSWER: &str = "ℹ️ **Offline Mode:** Checklist:\n1. Paid $30 fee?\n2. Test < 90 days old?\n3. GVWR > 14k lbs?\n\nCall: **617-359-6953**.";

/// First entry whose keyword appears in the question, else the generic checklist.
pub fn offline_answer(question: &str) -> &'static str {
    let lowered = question.to_lowercase();
    KNOWLEDGE_BASE
        .iter()
        .find(|entry| entry.keywords.iter().any(|k| lowered.contains(k)))
        .map_or(GENERIC_ANSWER, |entry| entry.answer)
}

/// The full offline chat reply, including the dispatch footer.
pub fn offline_reply(question: &str) -> String {
    format!("{}\n\nNeed clarity? {DISPATCH_PHONE}", offline_answer(question))
}
