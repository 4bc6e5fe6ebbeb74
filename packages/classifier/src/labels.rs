use std::path::Path;

use crate::error::ClassifyError;

/// Class labels indexed by model output position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels(Vec<String>);

impl Labels {
    /// Load labels from a newline-delimited file. Blank lines are skipped.
    pub fn load(path: &Path) -> Result<Self, ClassifyError> {
        if !path.exists() {
            return Err(ClassifyError::LabelsNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_lines(content.lines())
            .map_err(|_| ClassifyError::EmptyLabels(path.to_path_buf()))
    }

    pub fn from_lines<I, S>(lines: I) -> Result<Self, ClassifyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            return Err(ClassifyError::EmptyLabels(Default::default()));
        }
        Ok(Self(labels))
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }
}
