//! Commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - Parent commit ID(s) (for history)
//! - Author and committer information
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```
//!
//! Headers this engine does not produce (`gpgsig`, `encoding`, ...) are skipped
//! when reading, continuation lines included.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::BufRead;

/// Characters that would end or split an identity in a commit header
const FORBIDDEN_IDENTITY_CHARS: [char; 4] = ['\n', '\0', '<', '>'];

/// Author or committer information
///
/// Contains name, email, and timestamp with timezone information.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author with the current timestamp
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    /// Create a new author with a specific timestamp
    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// First character of the name or email that cannot appear in a header
    pub fn forbidden_char(&self) -> Option<char> {
        self.name
            .chars()
            .chain(self.email.chars())
            .find(|c| FORBIDDEN_IDENTITY_CHARS.contains(c))
    }

    /// "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// "Name <email> timestamp timezone", as written in commit headers
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Parse a date as accepted in `GIT_AUTHOR_DATE`
    ///
    /// Accepts RFC 2822, `%Y-%m-%d %H:%M:%S %z`, and git's raw `<unix-seconds> <±hhmm>`.
    pub fn parse_date(date_str: &str) -> anyhow::Result<chrono::DateTime<chrono::FixedOffset>> {
        if let Ok(date) = chrono::DateTime::parse_from_rfc2822(date_str)
            .or_else(|_| chrono::DateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S %z"))
        {
            return Ok(date);
        }

        let (seconds, timezone) = date_str
            .trim()
            .split_once(' ')
            .with_context(|| format!("Invalid author date {date_str}"))?;
        let seconds = seconds
            .parse::<i64>()
            .with_context(|| format!("Invalid author date {date_str}"))?;

        Self::from_raw(seconds, timezone)
    }

    /// Build a timestamp from unix seconds and a `±hhmm` offset
    fn from_raw(
        seconds: i64,
        timezone: &str,
    ) -> anyhow::Result<chrono::DateTime<chrono::FixedOffset>> {
        let (sign, digits) = match timezone.split_at_checked(1) {
            Some(("+", digits)) => (1, digits),
            Some(("-", digits)) => (-1, digits),
            _ => anyhow::bail!("Invalid timezone {timezone}"),
        };
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("Invalid timezone {timezone}");
        }
        let hours = digits[..2].parse::<i32>()?;
        let minutes = digits[2..].parse::<i32>()?;

        let offset = chrono::FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .with_context(|| format!("Invalid timezone {timezone}"))?;
        let utc = chrono::DateTime::from_timestamp(seconds, 0)
            .with_context(|| format!("Invalid timestamp {seconds}"))?;

        Ok(utc.with_timezone(&offset))
    }

    /// Load author information from environment variables
    ///
    /// Reads GIT_AUTHOR_NAME, GIT_AUTHOR_EMAIL, and optionally GIT_AUTHOR_DATE.
    /// If no date is provided, uses current time.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var("GIT_AUTHOR_NAME").context("GIT_AUTHOR_NAME not set")?;
        let email = std::env::var("GIT_AUTHOR_EMAIL").context("GIT_AUTHOR_EMAIL not set")?;

        match std::env::var("GIT_AUTHOR_DATE").ok() {
            Some(date) => Ok(Author::new_with_timestamp(name, email, Self::parse_date(&date)?)),
            None => Ok(Author::new(name, email)),
        }
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // Format: "name <email> timestamp timezone"
        // Split from right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            anyhow::bail!("Invalid author format");
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp"))?;
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '<'"))?;
        let email_end = name_email_part
            .rfind('>')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '>'"))?;
        if email_end < email_start {
            anyhow::bail!("Invalid author format: misplaced '>'");
        }

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        Ok(Author {
            name,
            email,
            timestamp: Self::from_raw(timestamp, timezone)?,
        })
    }
}

/// Commit object
///
/// Points to the tree representing the state of files, the parent commit(s),
/// and carries author, committer and message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for a root commit, several for a merge)
    parents: Vec<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    /// Create a new commit, with the author also recorded as committer
    ///
    /// The message is stored with a trailing newline, as git writes it.
    pub fn new(
        parents: Vec<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        let mut message = message;
        if !message.ends_with('\n') {
            message.push('\n');
        }

        Commit {
            parents,
            tree_oid,
            author: author.clone(),
            committer: author,
            message,
        }
    }

    /// First line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn committer(&self) -> &Author {
        &self.committer
    }

    /// Authoring timestamp
    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.author.timestamp()
    }
}

impl Packable for Commit {
    fn serialize_content(&self) -> anyhow::Result<Bytes> {
        let mut object_content = vec![];

        object_content.push(format!("tree {}", self.tree_oid.as_ref()));
        for parent in &self.parents {
            object_content.push(format!("parent {}", parent.as_ref()));
        }
        object_content.push(format!("author {}", self.author.display()));
        object_content.push(format!("committer {}", self.committer.display()));
        object_content.push(String::new());
        object_content.push(self.message.to_string());

        Ok(Bytes::from(object_content.join("\n")))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let (headers, message) = content
            .split_once("\n\n")
            .unwrap_or((content.as_str(), ""));

        let mut tree_oid = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            // continuation of a multi-line header such as gpgsig
            if line.starts_with(' ') {
                continue;
            }

            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "tree" => tree_oid = Some(ObjectId::try_parse(value.to_string())?),
                "parent" => parents.push(ObjectId::try_parse(value.to_string())?),
                "author" => author = Some(Author::try_from(value)?),
                "committer" => committer = Some(Author::try_from(value)?),
                _ => {}
            }
        }

        let tree_oid = tree_oid.context("Invalid commit object: missing tree line")?;
        let author = author.context("Invalid commit object: missing author line")?;
        let committer = committer.unwrap_or_else(|| author.clone());

        Ok(Commit {
            parents,
            tree_oid,
            author,
            committer,
            message: message.to_string(),
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixed_author() -> Author {
        Author::new_with_timestamp(
            "fake_user".to_string(),
            "fake_email@email.com".to_string(),
            Author::parse_date("2023-01-01 12:00:00 +0000").unwrap(),
        )
    }

    #[test]
    fn commit_id_matches_git() -> anyhow::Result<()> {
        let tree_oid =
            ObjectId::try_parse("65829399355e5929e44741d637d52c614ac21bc3".to_string())?;
        let commit = Commit::new(
            vec![],
            tree_oid,
            fixed_author(),
            "Initial commit".to_string(),
        );

        assert_eq!(
            commit.object_id()?.as_ref(),
            "147152a5ae31dfcc10dcd8ced8305d20bc640aab"
        );

        Ok(())
    }

    #[test]
    fn parses_merge_commits_and_skips_unknown_headers() -> anyhow::Result<()> {
        let raw = "tree 65829399355e5929e44741d637d52c614ac21bc3\n\
                   parent 147152a5ae31dfcc10dcd8ced8305d20bc640aab\n\
                   parent e69de29bb2d1d6434b8b29ae775ad8c2e48c5391\n\
                   author A U Thor <a@example.com> 1672574400 +0200\n\
                   committer C O Mitter <c@example.com> 1672574401 +0000\n\
                   gpgsig -----BEGIN PGP SIGNATURE-----\n \n -----END PGP SIGNATURE-----\n\
                   \n\
                   Merge branch 'feature'\n\nBody\n";

        let commit = Commit::deserialize(raw.as_bytes())?;

        assert_eq!(commit.parents().len(), 2);
        assert_eq!(commit.author().name(), "A U Thor");
        assert_eq!(commit.timestamp().timestamp(), 1672574400);
        assert_eq!(commit.timestamp().offset().local_minus_utc(), 2 * 3600);
        assert_eq!(commit.committer().email(), "c@example.com");
        assert_eq!(commit.short_message(), "Merge branch 'feature'");

        Ok(())
    }

    #[test]
    fn round_trips_author_lines() -> anyhow::Result<()> {
        let author = fixed_author();
        assert_eq!(Author::try_from(author.display().as_str())?, author);

        Ok(())
    }
}
