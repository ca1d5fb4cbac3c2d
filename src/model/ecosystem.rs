use serde::{Deserialize, Serialize};

/// A package registry that osscheck knows how to search.
///
/// Keys are matched case-insensitively; anything outside this set has no
/// registry adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    NuGet,
    Npm,
    PyPI,
    Maven,
    Go,
    #[serde(alias = "crates.io")]
    Crates,
    RubyGems,
    Packagist,
    Pub,
}

impl Ecosystem {
    /// Every supported ecosystem, in menu order.
    pub const ALL: [Ecosystem; 9] = [
        Ecosystem::NuGet,
        Ecosystem::Npm,
        Ecosystem::PyPI,
        Ecosystem::Maven,
        Ecosystem::Go,
        Ecosystem::Crates,
        Ecosystem::RubyGems,
        Ecosystem::Packagist,
        Ecosystem::Pub,
    ];

    /// Parses an ecosystem key, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for unrecognized keys.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "nuget" => Some(Ecosystem::NuGet),
            "npm" => Some(Ecosystem::Npm),
            "pypi" => Some(Ecosystem::PyPI),
            "maven" => Some(Ecosystem::Maven),
            "go" => Some(Ecosystem::Go),
            "crates" | "crates.io" => Some(Ecosystem::Crates),
            "rubygems" => Some(Ecosystem::RubyGems),
            "packagist" => Some(Ecosystem::Packagist),
            "pub" => Some(Ecosystem::Pub),
            _ => None,
        }
    }

    /// Parses a menu answer: a 1-based position in [`Ecosystem::ALL`] or a key.
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice.trim().parse::<usize>() {
            Ok(n) => n.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied(),
            Err(_) => Self::parse(choice),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::NuGet => "nuget",
            Ecosystem::Npm => "npm",
            Ecosystem::PyPI => "pypi",
            Ecosystem::Maven => "maven",
            Ecosystem::Go => "go",
            Ecosystem::Crates => "crates",
            Ecosystem::RubyGems => "rubygems",
            Ecosystem::Packagist => "packagist",
            Ecosystem::Pub => "pub",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::NuGet => "NuGet",
            Ecosystem::Npm => "npm",
            Ecosystem::PyPI => "PyPI",
            Ecosystem::Maven => "Maven",
            Ecosystem::Go => "Go",
            Ecosystem::Crates => "crates.io",
            Ecosystem::RubyGems => "RubyGems",
            Ecosystem::Packagist => "Packagist",
            Ecosystem::Pub => "Pub",
        }
    }

    /// Language or platform served by the registry, for menus.
    pub fn language(&self) -> &'static str {
        match self {
            Ecosystem::NuGet => ".NET",
            Ecosystem::Npm => "JS/Node",
            Ecosystem::PyPI => "Python",
            Ecosystem::Maven => "Java",
            Ecosystem::Go => "Golang",
            Ecosystem::Crates => "Rust",
            Ecosystem::RubyGems => "Ruby",
            Ecosystem::Packagist => "PHP",
            Ecosystem::Pub => "Dart/Flutter",
        }
    }

    /// Ecosystem name as used by the OSV.dev API.
    pub fn osv_name(&self) -> &'static str {
        match self {
            Ecosystem::NuGet => "NuGet",
            Ecosystem::Npm => "npm",
            Ecosystem::PyPI => "PyPI",
            Ecosystem::Maven => "Maven",
            Ecosystem::Go => "Go",
            Ecosystem::Crates => "crates.io",
            Ecosystem::RubyGems => "RubyGems",
            Ecosystem::Packagist => "Packagist",
            Ecosystem::Pub => "Pub",
        }
    }

    /// True when the registry only confirms exact identifiers instead of
    /// returning ranked matches.
    pub fn is_existence_probe(&self) -> bool {
        matches!(self, Ecosystem::PyPI | Ecosystem::Go)
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ecosystem::parse(s).ok_or_else(|| {
            let keys: Vec<&str> = Ecosystem::ALL.iter().map(|e| e.as_str()).collect();
            format!("Unknown ecosystem: {}. Use: {}", s, keys.join(", "))
        })
    }
}
