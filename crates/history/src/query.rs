use crate::error::HistoryError;
use crate::item::HistoryItem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    /// Ascending by value, code-point order.
    Value,
}

impl SortMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
            SortMode::Value => "value",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            "value" => Ok(SortMode::Value),
            _ => Err(HistoryError::UnknownSortMode(s.to_string())),
        }
    }
}

/// Display projection of a history list. The input is never modified; ties keep their
/// original relative order.
pub fn project(items: &[HistoryItem], search: &str, sort: SortMode) -> Vec<HistoryItem> {
    let needle = search.trim().to_uppercase();
    let mut out: Vec<HistoryItem> = if needle.is_empty() {
        items.to_vec()
    } else {
        items
            .iter()
            .filter(|item| item.value.to_uppercase().contains(&needle))
            .cloned()
            .collect()
    };
    match sort {
        SortMode::Newest => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::Oldest => out.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortMode::Value => out.sort_by(|a, b| a.value.cmp(&b.value)),
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryView {
    search: String,
    sort: SortMode,
}

impl QueryView {
    pub fn new(search: impl Into<String>, sort: SortMode) -> Self {
        Self {
            search: search.into(),
            sort,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn set_filter(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
    }

    pub fn apply(&self, items: &[HistoryItem]) -> Vec<HistoryItem> {
        project(items, &self.search, self.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::LookupKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn item(id: &str, value: &str, created_at: u64) -> HistoryItem {
        HistoryItem {
            id: id.to_string(),
            value: value.to_string(),
            kind: LookupKind::Vin,
            created_at,
        }
    }

    fn ids(items: &[HistoryItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    fn sample() -> Vec<HistoryItem> {
        vec![
            item("d", "1HGBH41JXMN109186", 40),
            item("c", "ZZZ", 30),
            item("b", "2FTRX18W1XCA01865", 20),
            item("a", "ABC", 10),
        ]
    }

    #[test]
    fn filter_keeps_relative_order() {
        let list = sample();
        let out = project(&list, "186", SortMode::Newest);
        assert_eq!(ids(&out), vec!["d", "b"]);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let list = sample();
        assert_eq!(ids(&project(&list, "abc", SortMode::Newest)), vec!["a"]);
        assert_eq!(ids(&project(&list, "  zz ", SortMode::Newest)), vec!["c"]);
        assert!(project(&list, "nope", SortMode::Newest).is_empty());
    }

    #[test]
    fn empty_search_is_unfiltered() {
        let list = sample();
        assert_eq!(project(&list, "", SortMode::Newest), list);
    }

    #[test]
    fn oldest_reverses_time_order() {
        let list = sample();
        assert_eq!(ids(&project(&list, "", SortMode::Oldest)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn value_sort_is_stable() {
        let list = vec![
            item("1", "BBB", 4),
            item("2", "AAA", 3),
            item("3", "BBB", 2),
            item("4", "AAA", 1),
        ];
        assert_eq!(ids(&project(&list, "", SortMode::Value)), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn newest_ties_keep_list_order() {
        let list = vec![item("x", "A", 5), item("y", "B", 5), item("z", "C", 9)];
        assert_eq!(ids(&project(&list, "", SortMode::Newest)), vec!["z", "x", "y"]);
    }

    #[test]
    fn view_applies_current_settings() {
        let list = sample();
        let mut view = QueryView::default();
        assert_eq!(view.apply(&list), list);
        view.set_filter("1");
        view.set_sort(SortMode::Value);
        assert_eq!(ids(&view.apply(&list)), vec!["d", "b"]);
        assert_eq!(view.sort(), SortMode::Value);
        assert_eq!(view.search(), "1");
    }

    #[test]
    fn parses_sort_modes() {
        assert_eq!("Newest".parse::<SortMode>().unwrap(), SortMode::Newest);
        assert_eq!("value".parse::<SortMode>().unwrap(), SortMode::Value);
        assert!("alpha".parse::<SortMode>().is_err());
    }

    proptest! {
        #[test]
        fn proptest_filter_is_subsequence(
            values in proptest::collection::vec("[A-C1-3]{1,4}", 0..16),
            needle in "[a-c1-3]{1,2}",
        ) {
            let list: Vec<HistoryItem> = values
                .iter()
                .enumerate()
                .map(|(i, v)| item(&i.to_string(), v, (values.len() - i) as u64))
                .collect();
            let out = project(&list, &needle, SortMode::Newest);
            let expected: Vec<HistoryItem> = list
                .iter()
                .filter(|i| i.value.contains(&needle.to_uppercase()))
                .cloned()
                .collect();
            prop_assert_eq!(out, expected);
        }
    }
}
