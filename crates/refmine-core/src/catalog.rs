use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RefmineError;

/// The refactoring types detected by the mining tool, in catalog order.
pub const DEFAULT_REFACTORINGS: [&str; 39] = [
    "Change Attribute Type",
    "Change Package",
    "Change Parameter Type",
    "Change Return Type",
    "Change Variable Type",
    "Extract And Move Method",
    "Extract Attribute",
    "Extract Class",
    "Extract Interface",
    "Extract Method",
    "Extract Subclass",
    "Extract Superclass",
    "Extract Variable",
    "Inline Method",
    "Inline Variable",
    "Merge Parameter",
    "Merge Variable",
    "Move And Inline Method",
    "Move And Rename Attribute",
    "Move And Rename Class",
    "Move And Rename Method",
    "Move Attribute",
    "Move Class",
    "Move Method",
    "Move Source Folder",
    "Parameterize Variable",
    "Pull Up Attribute",
    "Pull Up Method",
    "Push Down Attribute",
    "Push Down Method",
    "Rename Attribute",
    "Rename Class",
    "Rename Method",
    "Rename Parameter",
    "Rename Variable",
    "Replace Attribute",
    "Replace Variable With Attribute",
    "Split Parameter",
    "Split Variable",
];

/// Whether `name` can be embedded as a double-quoted SQL identifier.
///
/// # Examples
///
/// ```
/// use refmine_core::is_safe_identifier;
///
/// assert!(is_safe_identifier("Extract Method count"));
/// assert!(is_safe_identifier("RefactoringsWindow_6H"));
/// assert!(!is_safe_identifier("x\" OR 1=1 --"));
/// assert!(!is_safe_identifier(""));
/// ```
pub fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
}

/// A validated refactoring type name, used as both row and column label.
///
/// # Examples
///
/// ```
/// use refmine_core::RefactoringType;
///
/// let t = RefactoringType::new("Extract Method").unwrap();
/// assert_eq!(t.count_column(), "Extract Method count");
/// assert!(RefactoringType::new("bad`name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefactoringType(String);

impl RefactoringType {
    /// Validate and wrap a refactoring name.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::InvalidIdentifier`] if the name is not a safe
    /// SQL identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, RefmineError> {
        let name = name.into();
        if !is_safe_identifier(&name) {
            return Err(RefmineError::InvalidIdentifier(name));
        }
        Ok(Self(name))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Column holding this type's occurrences in the per-commit table.
    pub fn count_column(&self) -> String {
        format!("{} count", self.0)
    }
}

impl fmt::Display for RefactoringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RefactoringType {
    type Error = RefmineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RefactoringType> for String {
    fn from(value: RefactoringType) -> Self {
        value.0
    }
}

/// An ordered, duplicate-free list of refactoring types.
///
/// Catalog order decides the row and column order of every matrix.
///
/// # Examples
///
/// ```
/// use refmine_core::Catalog;
///
/// let catalog = Catalog::default();
/// assert_eq!(catalog.len(), 39);
/// assert_eq!(catalog.position("Extract Method"), Some(9));
///
/// let small = Catalog::from_names(["A", "B"]).unwrap();
/// assert_eq!(small.names(), vec!["A", "B"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    types: Vec<RefactoringType>,
}

impl Catalog {
    /// Build a catalog from names.
    ///
    /// # Errors
    ///
    /// Returns [`RefmineError::InvalidIdentifier`] for an unsafe name and
    /// [`RefmineError::Config`] for an empty list or a duplicate.
    pub fn from_names<I, S>(names: I) -> Result<Self, RefmineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut types = Vec::new();
        for name in names {
            let t = RefactoringType::new(name)?;
            if !seen.insert(t.clone()) {
                return Err(RefmineError::Config(format!(
                    "duplicate refactoring type in catalog: {t}"
                )));
            }
            types.push(t);
        }
        if types.is_empty() {
            return Err(RefmineError::Config(
                "refactoring catalog must not be empty".into(),
            ));
        }
        Ok(Self { types })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefactoringType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(RefactoringType::as_str).collect()
    }

    /// Index of `name` in catalog order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.as_str() == name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            types: DEFAULT_REFACTORINGS
                .iter()
                .map(|name| RefactoringType((*name).to_string()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_are_all_safe_and_unique() {
        let rebuilt = Catalog::from_names(DEFAULT_REFACTORINGS).unwrap();
        assert_eq!(rebuilt, Catalog::default());
    }

    #[test]
    fn quotes_and_semicolons_are_rejected() {
        for bad in ["a\"b", "a`b", "a;b", "a'b", " lead", "trail ", "new\nline"] {
            assert!(RefactoringType::new(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Catalog::from_names(["A", "B", "A"]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(Catalog::from_names(Vec::<String>::new()).is_err());
    }

    #[test]
    fn refactoring_type_deserializes_with_validation() {
        let ok: RefactoringType = serde_json::from_str("\"Move Class\"").unwrap();
        assert_eq!(ok.as_str(), "Move Class");
        assert!(serde_json::from_str::<RefactoringType>("\"Move\\\"Class\"").is_err());
    }
}
