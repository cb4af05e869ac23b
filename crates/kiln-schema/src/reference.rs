use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("malformed reference '{0}', expected 'name/version[@user/channel]'")]
    Malformed(String),
    #[error("invalid character in reference '{0}'")]
    InvalidCharacter(String),
    #[error("reference '{0}' does not pin an exact version")]
    InexactVersion(String),
}

/// The repository a dependency is published under (`user/channel`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel {
    pub user: String,
    pub channel: String,
}

/// A dependency reference: `name/version@user/channel`.
///
/// The version is exact. Ranges (`[>1.0 <2]`) and wildcards are rejected at
/// parse time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependencyRef {
    pub name: String,
    pub version: String,
    pub channel: Option<Channel>,
}

impl DependencyRef {
    pub fn new(name: &str, version: &str, channel: Option<Channel>) -> Self {
        Self {
            name: name.to_owned(),
            version: version.to_owned(),
            channel,
        }
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(c) = &self.channel {
            write!(f, "@{}/{}", c.user, c.channel)?;
        }
        Ok(())
    }
}

impl FromStr for DependencyRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (head, channel) = match s.split_once('@') {
            Some((head, tail)) => {
                let (user, channel) = tail
                    .split_once('/')
                    .ok_or_else(|| ReferenceError::Malformed(s.to_owned()))?;
                check_component(s, user)?;
                check_component(s, channel)?;
                (
                    head,
                    Some(Channel {
                        user: user.to_owned(),
                        channel: channel.to_owned(),
                    }),
                )
            }
            None => (s, None),
        };

        let (name, version) = head
            .split_once('/')
            .ok_or_else(|| ReferenceError::Malformed(s.to_owned()))?;
        if version.starts_with('[') || version.contains('*') {
            return Err(ReferenceError::InexactVersion(s.to_owned()));
        }
        check_component(s, name)?;
        check_component(s, version)?;

        Ok(Self {
            name: name.to_owned(),
            version: version.to_owned(),
            channel,
        })
    }
}

impl Serialize for DependencyRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DependencyRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Version components and reference parts share one alphabet.
pub fn is_component_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-')
}

fn check_component(whole: &str, part: &str) -> Result<(), ReferenceError> {
    if part.is_empty() {
        return Err(ReferenceError::Malformed(whole.to_owned()));
    }
    if !part.chars().all(is_component_char) {
        return Err(ReferenceError::InvalidCharacter(whole.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_reference() {
        let r: DependencyRef = "coda-oss/CMake_update_win_ede7427059e489bc@user/testing"
            .parse()
            .unwrap();
        assert_eq!(r.name, "coda-oss");
        assert_eq!(r.version, "CMake_update_win_ede7427059e489bc");
        let c = r.channel.as_ref().unwrap();
        assert_eq!(c.user, "user");
        assert_eq!(c.channel, "testing");
        assert_eq!(
            r.to_string(),
            "coda-oss/CMake_update_win_ede7427059e489bc@user/testing"
        );
    }

    #[test]
    fn channel_is_optional() {
        let r: DependencyRef = "zlib/1.3.1".parse().unwrap();
        assert!(r.channel.is_none());
        assert_eq!(r.to_string(), "zlib/1.3.1");
    }

    #[test]
    fn rejects_malformed_references() {
        assert!(matches!(
            "zlib".parse::<DependencyRef>(),
            Err(ReferenceError::Malformed(_))
        ));
        assert!(matches!(
            "zlib/1.3@user".parse::<DependencyRef>(),
            Err(ReferenceError::Malformed(_))
        ));
        assert!(matches!(
            "/1.3".parse::<DependencyRef>(),
            Err(ReferenceError::Malformed(_))
        ));
        assert!(matches!(
            "zl ib/1.3".parse::<DependencyRef>(),
            Err(ReferenceError::InvalidCharacter(_))
        ));
    }

    #[test]
    fn rejects_version_ranges() {
        assert!(matches!(
            "zlib/[>1.2 <2]".parse::<DependencyRef>(),
            Err(ReferenceError::InexactVersion(_))
        ));
        assert!(matches!(
            "zlib/1.*".parse::<DependencyRef>(),
            Err(ReferenceError::InexactVersion(_))
        ));
    }

    #[test]
    fn serializes_as_string() {
        let r: DependencyRef = "nitro/2.11.5@user/stable".parse().unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"nitro/2.11.5@user/stable\"");
        let back: DependencyRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
