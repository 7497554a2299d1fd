//! Raw try arguments, read from the try line without consulting the graph.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{Result, TrySyntaxError};
use crate::tokenize::split_try_msg;

/// Who gets emailed about try results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Notifications {
    /// Every completed task (`-e`)
    All,
    /// Failed or exceptioned tasks (`-f`)
    Failure,
}

/// Flags as written on the try line, defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TryArgs {
    /// `-b`: build type letters (`o`, `d`)
    pub build_types: Option<String>,
    /// `-p`: comma list or `all`
    pub platforms: String,
    /// `-u`: test spec or `all`/`none`/`common`
    pub unittests: String,
    /// `-t`: talos spec
    pub talos: String,
    /// `-r`: raptor spec
    pub raptor: String,
    /// `-j`: job names, repeatable
    pub jobs: Vec<String>,
    /// `-i`
    pub interactive: bool,
    /// `-e` / `-f`
    pub notifications: Option<Notifications>,
    /// `--rebuild`
    pub trigger_tests: u32,
    /// `--rebuild-talos`
    pub talos_trigger_tests: u32,
    /// `--rebuild-raptor`
    pub raptor_trigger_tests: u32,
    /// `--setenv NAME=VALUE`, repeatable
    pub env: BTreeMap<String, String>,
    /// `--gecko-profile`
    pub gecko_profile: bool,
    /// `--tag`, repeatable
    pub tags: Vec<String>,
    /// `--no-retry`
    pub no_retry: bool,
    /// `--include-nightly`
    pub include_nightly: bool,
    /// `--artifact`
    pub artifact: bool,
}

impl Default for TryArgs {
    fn default() -> Self {
        Self {
            build_types: None,
            platforms: "all".to_string(),
            unittests: "all".to_string(),
            talos: "none".to_string(),
            raptor: "none".to_string(),
            jobs: Vec::new(),
            interactive: false,
            notifications: None,
            trigger_tests: 1,
            talos_trigger_tests: 1,
            raptor_trigger_tests: 1,
            env: BTreeMap::new(),
            gecko_profile: false,
            tags: Vec::new(),
            no_retry: false,
            include_nightly: false,
            artifact: false,
        }
    }
}

#[derive(Clone, Copy)]
enum Arity {
    /// Takes exactly one value
    Value,
    /// Takes an optional value, `all` when omitted
    Optional,
    /// Takes no value
    Flag,
}

#[derive(Clone, Copy)]
enum Dest {
    BuildTypes,
    Platforms,
    Unittests,
    Talos,
    Raptor,
    Jobs,
    Interactive,
    AllEmails,
    FailureEmails,
    Rebuild,
    RebuildTalos,
    RebuildRaptor,
    SetEnv,
    GeckoProfile,
    Tag,
    NoRetry,
    IncludeNightly,
    Artifact,
    TaskclusterWorker,
}

const FLAGS: &[(Option<char>, &str, Arity, Dest)] = &[
    (Some('b'), "build", Arity::Value, Dest::BuildTypes),
    (Some('p'), "platform", Arity::Optional, Dest::Platforms),
    (Some('u'), "unittests", Arity::Optional, Dest::Unittests),
    (Some('t'), "talos", Arity::Optional, Dest::Talos),
    (Some('r'), "raptor", Arity::Optional, Dest::Raptor),
    (Some('j'), "job", Arity::Value, Dest::Jobs),
    (Some('i'), "interactive", Arity::Flag, Dest::Interactive),
    (Some('e'), "all-emails", Arity::Flag, Dest::AllEmails),
    (Some('f'), "failure-emails", Arity::Flag, Dest::FailureEmails),
    (Some('w'), "taskcluster-worker", Arity::Flag, Dest::TaskclusterWorker),
    (None, "rebuild", Arity::Value, Dest::Rebuild),
    (None, "rebuild-talos", Arity::Value, Dest::RebuildTalos),
    (None, "rebuild-raptor", Arity::Value, Dest::RebuildRaptor),
    (None, "setenv", Arity::Value, Dest::SetEnv),
    (None, "gecko-profile", Arity::Flag, Dest::GeckoProfile),
    (None, "tag", Arity::Value, Dest::Tag),
    (None, "no-retry", Arity::Flag, Dest::NoRetry),
    (None, "include-nightly", Arity::Flag, Dest::IncludeNightly),
    (None, "artifact", Arity::Flag, Dest::Artifact),
];

fn lookup_short(c: char) -> Option<(Arity, Dest)> {
    FLAGS
        .iter()
        .find(|(short, ..)| *short == Some(c))
        .map(|&(_, _, arity, dest)| (arity, dest))
}

fn lookup_long(name: &str) -> Option<(Arity, Dest)> {
    FLAGS
        .iter()
        .find(|(_, long, ..)| *long == name)
        .map(|&(_, _, arity, dest)| (arity, dest))
}

/// Parse the try line of a commit message.
///
/// Returns `None` when the message has no `try:` marker. Unknown flags and
/// stray positionals are ignored with a warning.
pub fn parse_message(message: &str) -> Result<Option<TryArgs>> {
    let tokens = split_try_msg(message)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut args = TryArgs::default();
    let mut rest = tokens[1..].iter().peekable();

    while let Some(token) = rest.next() {
        let (flag, spec, attached) = if let Some(long) = token.strip_prefix("--") {
            let (name, value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (long, None),
            };
            (token.as_str(), lookup_long(name), value)
        } else if let Some(short) = token.strip_prefix('-').filter(|s| !s.is_empty()) {
            let mut chars = short.chars();
            let c = chars.next().unwrap_or_default();
            let remainder: String = chars.collect();
            let value = (!remainder.is_empty()).then_some(remainder);
            (token.as_str(), lookup_short(c), value)
        } else {
            warn!("ignoring unexpected try syntax argument '{}'", token);
            continue;
        };

        let Some((arity, dest)) = spec else {
            warn!("ignoring unknown try syntax flag '{}'", flag);
            continue;
        };

        let value = match arity {
            Arity::Flag => None,
            Arity::Value => match attached {
                Some(v) => Some(v),
                None => match rest.next_if(|next| !next.starts_with('-')) {
                    Some(v) => Some(v.clone()),
                    None => return Err(TrySyntaxError::MissingValue(flag.to_string())),
                },
            },
            Arity::Optional => Some(
                attached
                    .or_else(|| rest.next_if(|next| !next.starts_with('-')).cloned())
                    .unwrap_or_else(|| "all".to_string()),
            ),
        };

        apply(&mut args, flag, dest, value.unwrap_or_default())?;
    }

    Ok(Some(args))
}

fn apply(args: &mut TryArgs, flag: &str, dest: Dest, value: String) -> Result<()> {
    match dest {
        Dest::BuildTypes => args.build_types = Some(value),
        Dest::Platforms => args.platforms = value,
        Dest::Unittests => args.unittests = value,
        Dest::Talos => args.talos = value,
        Dest::Raptor => args.raptor = value,
        Dest::Jobs => args.jobs.push(value),
        Dest::Interactive => args.interactive = true,
        Dest::AllEmails => args.notifications = Some(Notifications::All),
        Dest::FailureEmails => args.notifications = Some(Notifications::Failure),
        Dest::Rebuild => args.trigger_tests = parse_count(flag, &value)?,
        Dest::RebuildTalos => args.talos_trigger_tests = parse_count(flag, &value)?,
        Dest::RebuildRaptor => args.raptor_trigger_tests = parse_count(flag, &value)?,
        Dest::SetEnv => {
            let Some((name, val)) = value.split_once('=') else {
                return Err(TrySyntaxError::InvalidValue { flag: flag.to_string(), value });
            };
            args.env.insert(name.to_string(), val.to_string());
        }
        Dest::GeckoProfile => args.gecko_profile = true,
        Dest::Tag => args.tags.push(value),
        Dest::NoRetry => args.no_retry = true,
        Dest::IncludeNightly => args.include_nightly = true,
        Dest::Artifact => args.artifact = true,
        Dest::TaskclusterWorker => {}
    }
    Ok(())
}

fn parse_count(flag: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| TrySyntaxError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}
