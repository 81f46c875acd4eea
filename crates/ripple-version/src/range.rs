use std::fmt;

use semver::Version;

const WORKSPACE_PROTOCOL: &str = "workspace:";

/// Operators whose meaning survives substituting a newer version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOperator {
    Exact,
    Equal,
    Caret,
    Tilde,
    GreaterOrEqual,
}

impl RangeOperator {
    // Longest prefix first so ">=" is not read as "=".
    const PREFIXED: [(&'static str, Self); 4] = [
        (">=", Self::GreaterOrEqual),
        ("=", Self::Equal),
        ("^", Self::Caret),
        ("~", Self::Tilde),
    ];

    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Exact => "",
            Self::Equal => "=",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::GreaterOrEqual => ">=",
        }
    }

    fn split(range: &str) -> (Self, &str) {
        Self::PREFIXED
            .iter()
            .find_map(|(prefix, op)| {
                range
                    .strip_prefix(prefix)
                    .map(|rest| (*op, rest.trim_start()))
            })
            .unwrap_or((Self::Exact, range))
    }
}

/// The recognized shape of a dependency range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeStyle {
    /// An operator followed by a concrete version, optionally behind the
    /// `workspace:` protocol.
    Versioned {
        workspace: bool,
        operator: RangeOperator,
    },
    /// `workspace:*`, `workspace:^` or `workspace:~`; resolved at publish
    /// time, so it never needs rewriting.
    WorkspaceAlias(char),
}

impl RangeStyle {
    /// Recognizes the style of `range`, or `None` for anything that is not a
    /// single operator plus a full version (compound ranges, tags, URLs).
    #[must_use]
    pub fn parse(range: &str) -> Option<Self> {
        let range = range.trim();
        let (workspace, rest) = match range.strip_prefix(WORKSPACE_PROTOCOL) {
            Some(rest) => (true, rest.trim()),
            None => (false, range),
        };

        if workspace {
            if let [alias @ (b'*' | b'^' | b'~')] = rest.as_bytes() {
                return Some(Self::WorkspaceAlias(char::from(*alias)));
            }
            // A bare protocol pins to whatever version is written next.
            if rest.is_empty() {
                return Some(Self::Versioned {
                    workspace: true,
                    operator: RangeOperator::Exact,
                });
            }
        }

        let (operator, version) = RangeOperator::split(rest);
        Version::parse(version).ok()?;

        Some(Self::Versioned {
            workspace,
            operator,
        })
    }

    #[must_use]
    pub fn render(&self, version: &Version) -> String {
        match self {
            Self::Versioned {
                workspace,
                operator,
            } => {
                let protocol = if *workspace { WORKSPACE_PROTOCOL } else { "" };
                format!("{protocol}{}{version}", operator.prefix())
            }
            Self::WorkspaceAlias(alias) => format!("{WORKSPACE_PROTOCOL}{alias}"),
        }
    }
}

impl fmt::Display for RangeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Rewrites `old_range` to point at `new_version`, keeping its operator.
///
/// Ranges whose style is not recognized become an exact pin on
/// `new_version`.
#[must_use]
pub fn rewrite_range(old_range: &str, new_version: &Version) -> String {
    match RangeStyle::parse(old_range) {
        Some(style) => style.render(new_version),
        None => new_version.to_string(),
    }
}
