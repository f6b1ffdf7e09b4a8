use serde::{Deserialize, Serialize};

/// Settings that influence how text is parsed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Symbols defined before the first line of the text.
    pub preprocessor_symbols: Vec<String>,
}

impl ParseOptions {
    pub fn with_preprocessor_symbols<S: Into<String>>(
        mut self,
        symbols: impl IntoIterator<Item = S>,
    ) -> Self {
        self.preprocessor_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let options: ParseOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ParseOptions::default());

        let options: ParseOptions =
            serde_json::from_str(r#"{"preprocessor_symbols": ["DEBUG"]}"#).unwrap();
        assert_eq!(options, ParseOptions::default().with_preprocessor_symbols(["DEBUG"]));
    }
}
