use std::collections::HashSet;

/// Fields assigned since construction, the last successful save, or the last load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyFields {
    fields: HashSet<String>,
}

impl DirtyFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, field: &str) {
        if !self.fields.contains(field) {
            self.fields.insert(field.to_string());
        }
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_clear() {
        let mut dirty = DirtyFields::new();
        assert!(!dirty.is_dirty("name"));
        dirty.mark("name");
        dirty.mark("name");
        assert!(dirty.is_dirty("name"));
        assert_eq!(dirty.len(), 1);
        dirty.clear();
        assert!(dirty.is_empty());
        assert!(!dirty.is_dirty("name"));
    }
}
