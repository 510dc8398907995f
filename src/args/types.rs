use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;
use std::num::{NonZeroU64, NonZeroUsize};

use crate::error::ValidationError;

/// Inter-arrival distribution used when a target rate is set.
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    Poisson,
    Regular,
}

impl std::str::FromStr for WaitMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poisson" => Ok(WaitMode::Poisson),
            "regular" => Ok(WaitMode::Regular),
            _ => Err(ValidationError::InvalidWaitMode {
                value: s.to_owned(),
            }),
        }
    }
}

/// Readiness backend. `Auto` picks the best one for the platform.
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Auto,
    Poll,
    Epoll,
    Kqueue,
}

impl BackendKind {
    #[must_use]
    pub const fn resolve(self) -> Self {
        match self {
            BackendKind::Auto => platform_backend(),
            BackendKind::Poll | BackendKind::Epoll | BackendKind::Kqueue => self,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BackendKind::Auto => "auto",
            BackendKind::Poll => "poll",
            BackendKind::Epoll => "epoll",
            BackendKind::Kqueue => "kqueue",
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const fn platform_backend() -> BackendKind {
    BackendKind::Epoll
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd"
))]
const fn platform_backend() -> BackendKind {
    BackendKind::Kqueue
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "openbsd"
)))]
const fn platform_backend() -> BackendKind {
    BackendKind::Poll
}

impl std::str::FromStr for BackendKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "poll" => Ok(BackendKind::Poll),
            "epoll" => Ok(BackendKind::Epoll),
            "kqueue" => Ok(BackendKind::Kqueue),
            _ => Err(ValidationError::InvalidBackend {
                value: s.to_owned(),
            }),
        }
    }
}

/// `host:port` as given by the user; IPv6 literals use `[addr]:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl std::str::FromStr for TargetSpec {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let (host, port) = if let Some(rest) = value.strip_prefix('[') {
            let (host, tail) =
                rest.split_once(']')
                    .ok_or_else(|| ValidationError::InvalidTargetFormat {
                        value: s.to_owned(),
                    })?;
            let port = tail
                .strip_prefix(':')
                .ok_or_else(|| ValidationError::InvalidTargetFormat {
                    value: s.to_owned(),
                })?;
            (host, port)
        } else {
            value
                .rsplit_once(':')
                .ok_or_else(|| ValidationError::InvalidTargetFormat {
                    value: s.to_owned(),
                })?
        };
        if host.is_empty() {
            return Err(ValidationError::TargetHostEmpty {
                value: s.to_owned(),
            });
        }
        if host.contains(':') && !value.starts_with('[') {
            return Err(ValidationError::InvalidTargetFormat {
                value: s.to_owned(),
            });
        }
        let port = port
            .parse::<u16>()
            .map_err(|err| ValidationError::InvalidTargetPort {
                value: s.to_owned(),
                source: err,
            })?;
        Ok(TargetSpec {
            host: host.to_owned(),
            port,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveU64(NonZeroU64);

impl PositiveU64 {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for PositiveU64 {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        NonZeroU64::new(value)
            .map(PositiveU64)
            .ok_or(ValidationError::ValueTooSmall { min: 1 })
    }
}

impl std::str::FromStr for PositiveU64 {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u64 = s
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;
        PositiveU64::try_from(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositiveUsize(NonZeroUsize);

impl PositiveUsize {
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for PositiveUsize {
    type Error = ValidationError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(value)
            .map(PositiveUsize)
            .ok_or(ValidationError::ValueTooSmall { min: 1 })
    }
}

impl std::str::FromStr for PositiveUsize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: usize = s
            .parse()
            .map_err(|err| ValidationError::InvalidNumber { source: err })?;
        PositiveUsize::try_from(value)
    }
}
