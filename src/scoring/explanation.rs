use std::fmt;
use serde::Serialize;

/// Score explanation for debugging.
///
/// A node's value is the number it contributed; `details` list the factors
/// or sub-scores it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub value: f32,
    pub description: String,
    pub details: Vec<Explanation>,
}

impl Explanation {
    pub fn new(value: f32, description: impl Into<String>) -> Self {
        Explanation {
            value,
            description: description.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: Explanation) -> Self {
        self.details.push(detail);
        self
    }

    pub fn add_detail(&mut self, detail: Explanation) {
        self.details.push(detail);
    }

    fn write_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} = {}", "", self.value, self.description, indent = depth * 2)?;
        for detail in &self.details {
            detail.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_indents_each_level() {
        let explanation = Explanation::new(3.0, "sum of:")
            .with_detail(Explanation::new(1.0, "a").with_detail(Explanation::new(1.0, "boost")))
            .with_detail(Explanation::new(2.0, "b"));
        assert_eq!(explanation.to_string(), "3 = sum of:\n  1 = a\n    1 = boost\n  2 = b\n");
    }
}
