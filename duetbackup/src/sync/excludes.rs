use super::paths::clean_remote_path;

/// Remote path prefixes that are left out of the backup.
///
/// Matching is a plain string-prefix test on cleaned paths, not a per-segment
/// one: `0:/sys` also covers `0:/system`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    prefixes: Vec<String>,
}

impl ExcludeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, prefix: &str) {
        let cleaned = clean_remote_path(prefix);
        if !self.prefixes.contains(&cleaned) {
            self.prefixes.push(cleaned);
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        let path = clean_remote_path(path);
        self.prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExcludeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for prefix in iter {
            set.add(prefix.as_ref());
        }
        set
    }
}
