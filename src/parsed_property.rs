use std::{fmt::Display, ops::Deref, path::PathBuf};

/// A resolved setting together with the place it came from.
///
/// Layers are merged lowest to highest: `Default`, `File`, `Git`, `Env`, `Cli`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedProperty<T> {
    /// Command line flag (parsed_value, flag text)
    Cli(T, String),
    /// Environment variable (parsed_value, variable name)
    Env(T, String),
    /// Detected from the `origin` remote (parsed_value, remote url)
    Git(T, String),
    /// Config file entry (parsed_value, file path)
    File(T, PathBuf),
    /// Built-in default
    Default(T),
}

impl<T> ParsedProperty<T> {
    pub fn value(&self) -> &T {
        match self {
            ParsedProperty::Cli(value, _)
            | ParsedProperty::Env(value, _)
            | ParsedProperty::Git(value, _)
            | ParsedProperty::File(value, _)
            | ParsedProperty::Default(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ParsedProperty::Cli(value, _)
            | ParsedProperty::Env(value, _)
            | ParsedProperty::Git(value, _)
            | ParsedProperty::File(value, _)
            | ParsedProperty::Default(value) => value,
        }
    }

    pub fn source_name(&self) -> &'static str {
        match self {
            ParsedProperty::Cli(..) => "cli",
            ParsedProperty::Env(..) => "env",
            ParsedProperty::Git(..) => "git",
            ParsedProperty::File(..) => "file",
            ParsedProperty::Default(_) => "default",
        }
    }

    /// Human readable origin, used in debug logs.
    pub fn origin(&self) -> String {
        match self {
            ParsedProperty::Cli(_, flag) => format!("command line ({flag})"),
            ParsedProperty::Env(_, var) => format!("environment ({var})"),
            ParsedProperty::Git(_, url) => format!("git remote ({url})"),
            ParsedProperty::File(_, path) => format!("config file ({})", path.display()),
            ParsedProperty::Default(_) => "default".to_string(),
        }
    }
}

impl<T> Deref for ParsedProperty<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value()
    }
}

impl<T: Display> Display for ParsedProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value().fmt(f)
    }
}

impl<T> From<T> for ParsedProperty<T> {
    fn from(value: T) -> Self {
        ParsedProperty::Default(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # ParsedProperty Value Access
    ///
    /// Tests accessing the parsed value from every source variant.
    ///
    /// ## Test Scenario
    /// - Builds one property per source
    /// - Reads the value through value(), Deref and into_value()
    ///
    /// ## Expected Outcome
    /// - All accessors return the same parsed value
    #[test]
    fn test_value_access() {
        let props = vec![
            ParsedProperty::Cli("contoso".to_string(), "--org".to_string()),
            ParsedProperty::Env("contoso".to_string(), "ADO_ORG".to_string()),
            ParsedProperty::Git(
                "contoso".to_string(),
                "https://dev.azure.com/contoso/app/_git/app".to_string(),
            ),
            ParsedProperty::File("contoso".to_string(), PathBuf::from("config.toml")),
            ParsedProperty::Default("contoso".to_string()),
        ];

        for prop in props {
            assert_eq!(prop.value(), "contoso");
            assert_eq!(prop.len(), 7);
            assert_eq!(prop.into_value(), "contoso");
        }
    }

    /// # Source Reporting
    ///
    /// Tests that each variant reports its source.
    ///
    /// ## Test Scenario
    /// - Reads source_name() and origin() for each variant
    ///
    /// ## Expected Outcome
    /// - Short names and descriptive origins match the variant
    #[test]
    fn test_source_reporting() {
        let cli = ParsedProperty::Cli(60u64, "--timeout".to_string());
        assert_eq!(cli.source_name(), "cli");
        assert_eq!(cli.origin(), "command line (--timeout)");

        let env = ParsedProperty::Env(60u64, "ADO_TIMEOUT_SECS".to_string());
        assert_eq!(env.source_name(), "env");
        assert!(env.origin().contains("ADO_TIMEOUT_SECS"));

        let file = ParsedProperty::File(60u64, PathBuf::from("/tmp/config.toml"));
        assert_eq!(file.source_name(), "file");
        assert!(file.origin().contains("/tmp/config.toml"));

        let default: ParsedProperty<u64> = 60.into();
        assert_eq!(default.source_name(), "default");
        assert_eq!(default.to_string(), "60");
    }
}
