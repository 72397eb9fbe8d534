//! Target dialects and versions for conformance validation.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    W3c,
    MarkLogic,
    SaxonPe,
    SaxonEe,
    BaseX,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::W3c => "w3c",
            Dialect::MarkLogic => "marklogic",
            Dialect::SaxonPe => "saxon-pe",
            Dialect::SaxonEe => "saxon-ee",
            Dialect::BaseX => "basex",
        }
    }

    /// The newest version this crate knows about, used when a target
    /// names only a dialect.
    pub fn latest_version(self) -> Version {
        match self {
            Dialect::W3c => Version::new(3, 1),
            Dialect::MarkLogic => Version::new(10, 0),
            Dialect::SaxonPe | Dialect::SaxonEe => Version::new(10, 0),
            Dialect::BaseX => Version::new(9, 0),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown dialect `{0}` (expected w3c, marklogic, saxon-pe, saxon-ee, or basex)")]
pub struct UnknownDialect(String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, UnknownDialect> {
        match s {
            "w3c" => Ok(Dialect::W3c),
            "marklogic" => Ok(Dialect::MarkLogic),
            "saxon-pe" => Ok(Dialect::SaxonPe),
            "saxon-ee" => Ok(Dialect::SaxonEe),
            "basex" => Ok(Dialect::BaseX),
            _ => Err(UnknownDialect(s.to_owned())),
        }
    }
}

/// A `major.minor` product or spec version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid version `{0}` (expected `major.minor`)")]
pub struct InvalidVersion(String);

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, InvalidVersion> {
        let bad = || InvalidVersion(s.to_owned());
        let (major, minor) = s.split_once('.').ok_or_else(bad)?;
        Ok(Version {
            major: major.parse().map_err(|_| bad())?,
            minor: minor.parse().map_err(|_| bad())?,
        })
    }
}

/// A validation target: a dialect at a specific version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialectVersion {
    pub dialect: Dialect,
    pub version: Version,
}

impl DialectVersion {
    pub const fn new(dialect: Dialect, version: Version) -> Self {
        Self { dialect, version }
    }
}

impl fmt::Display for DialectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dialect, self.version)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid target `{0}` (expected `dialect` or `dialect/version`)")]
pub struct InvalidTarget(String);

/// Parses `w3c/3.1` or a bare dialect name at its latest version.
impl FromStr for DialectVersion {
    type Err = InvalidTarget;

    fn from_str(s: &str) -> Result<Self, InvalidTarget> {
        let bad = || InvalidTarget(s.to_owned());
        match s.split_once('/') {
            Some((dialect, version)) => {
                let dialect: Dialect = dialect.parse().map_err(|_| bad())?;
                let version = version.parse().map_err(|_| bad())?;
                Ok(DialectVersion::new(dialect, version))
            }
            None => {
                let dialect: Dialect = s.parse().map_err(|_| bad())?;
                Ok(DialectVersion::new(dialect, dialect.latest_version()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_order_numerically() {
        assert!(Version::new(9, 8) > Version::new(9, 4));
        assert!(Version::new(10, 0) > Version::new(9, 9));
        assert!(Version::new(3, 1) > Version::new(3, 0));
    }

    #[test]
    fn targets_parse_with_and_without_version() {
        let t: DialectVersion = "saxon-pe/9.8".parse().unwrap();
        assert_eq!(t.dialect, Dialect::SaxonPe);
        assert_eq!(t.version, Version::new(9, 8));

        let t: DialectVersion = "w3c".parse().unwrap();
        assert_eq!(t.version, Version::new(3, 1));

        assert!("w3c/three.one".parse::<DialectVersion>().is_err());
        assert!("oracle/12.0".parse::<DialectVersion>().is_err());
    }
}
