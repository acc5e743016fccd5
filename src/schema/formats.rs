//! Named string formats checked by the `invalid_format` error code.
//!
//! A handful of predicates that need nothing beyond `fancy-regex` and
//! `std::net` — the full JSON-Schema format vocabulary pulls in
//! `addr`/`time`/`uuid`, none of which anything else in this crate needs.

use lazy_static::lazy_static;
use serde::Deserialize;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    Date,
    DateTime,
    Email,
    Hostname,
    Ipv4,
    Ipv6,
    Uuid,
}

lazy_static! {
    static ref DATE_RE: fancy_regex::Regex =
        fancy_regex::Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref DATE_TIME_RE: fancy_regex::Regex = fancy_regex::Regex::new(
        r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$"
    )
    .unwrap();
    static ref EMAIL_RE: fancy_regex::Regex =
        fancy_regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref HOSTNAME_RE: fancy_regex::Regex = fancy_regex::Regex::new(
        r"^(?=.{1,253}$)([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)*[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$"
    )
    .unwrap();
    static ref UUID_RE: fancy_regex::Regex = fancy_regex::Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::Email => "email",
            Format::Hostname => "hostname",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Uuid => "uuid",
        }
    }

    pub fn validate(&self, value: &str) -> bool {
        match self {
            Format::Date => DATE_RE.is_match(value).unwrap_or(false),
            Format::DateTime => DATE_TIME_RE.is_match(value).unwrap_or(false),
            Format::Email => EMAIL_RE.is_match(value).unwrap_or(false),
            Format::Hostname => HOSTNAME_RE.is_match(value).unwrap_or(false),
            Format::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
            Format::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
            Format::Uuid => UUID_RE.is_match(value).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_validates() {
        assert!(Format::Ipv4.validate("127.0.0.1"));
        assert!(!Format::Ipv4.validate("not-an-ip"));
    }

    #[test]
    fn uuid_validates() {
        assert!(Format::Uuid.validate("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!Format::Uuid.validate("not-a-uuid"));
    }

    #[test]
    fn email_validates() {
        assert!(Format::Email.validate("a@b.com"));
        assert!(!Format::Email.validate("not-an-email"));
    }
}
