//! Allowlist of channels whose posts are relayed.
//!
//! Deny-by-default: a chat id that is not listed is ignored. Matching is exact
//! on the string form of the id (`-100123`, or `@channelname` for public
//! channels addressed by username).

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatAllowList {
    ids: HashSet<String>,
}

impl ChatAllowList {
    /// Build from configured ids. Entries are trimmed; blank entries dropped.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(|id| id.as_ref().trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    /// Returns `true` when posts from `chat_id` should be relayed.
    pub fn is_allowed(&self, chat_id: &str) -> bool {
        self.ids.contains(chat_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_denies_all() {
        let list = ChatAllowList::new(Vec::<String>::new());
        assert!(list.is_empty());
        assert!(!list.is_allowed("-100123"));
    }

    #[test]
    fn match_by_numeric_chat_id() {
        let list = ChatAllowList::new(["-100123"]);
        assert!(list.is_allowed("-100123"));
        assert!(!list.is_allowed("-100999"));
    }

    #[test]
    fn entries_are_trimmed() {
        let list = ChatAllowList::new([" -100123 ", "", "  "]);
        assert_eq!(list.len(), 1);
        assert!(list.is_allowed("-100123"));
    }

    #[test]
    fn wildcard_has_no_special_meaning() {
        let list = ChatAllowList::new(["*"]);
        assert!(!list.is_allowed("-100123"));
    }

    #[test]
    fn multiple_entries_any_match() {
        let list = ChatAllowList::new(["-100123", "@mychannel"]);
        assert!(list.is_allowed("@mychannel"));
        assert!(list.is_allowed("-100123"));
        assert!(!list.is_allowed("mychannel"));
    }
}
