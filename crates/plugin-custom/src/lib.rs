//! `!custom`: list, add, delete and audit user-defined commands.
//!
//! This is also what the bot shows when someone says "screambot custom".

use core::fmt::Write as _;

use anyhow::Result;
use async_trait::async_trait;
use command_store::{AuditAction, AuditRecord, CommandStore, CustomCommand, StoreError};
use plugin_core::{Plugin, PluginContext, PluginSpec, send_text, truncate};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tracing::warn;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day], [year]");
const DEFAULT_AUDIT_LIMIT: usize = 10;
const MAX_AUDIT_LIMIT: usize = 50;
const UNAVAILABLE: &str = "Custom commands are unavailable right now. Try again in a bit.";

const USAGE: &str = "Usage: !custom [list] | add <trigger> = <response> | delete <trigger> | audit [limit]\n\
                     Use $what in a response to capture the text after the trigger.";

#[derive(Debug)]
pub struct CustomCommands;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request<'a> {
    List,
    Add { trigger: &'a str, response: &'a str },
    Delete(&'a str),
    Audit(usize),
    Usage,
}

fn parse_request(args: &str) -> Request<'_> {
    let args = args.trim();
    let (verb, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
    let rest = rest.trim();
    match verb.to_lowercase().as_str() {
        "" | "list" => Request::List,
        "add" | "set" => match rest.split_once('=') {
            Some((trigger, response)) if !trigger.trim().is_empty() => Request::Add {
                trigger: trigger.trim(),
                response: response.trim(),
            },
            _ => Request::Usage,
        },
        "delete" | "remove" | "rm" if !rest.is_empty() => Request::Delete(rest),
        "audit" if rest.is_empty() => Request::Audit(DEFAULT_AUDIT_LIMIT),
        "audit" => rest
            .parse::<usize>()
            .map_or(Request::Usage, |n| Request::Audit(n.clamp(1, MAX_AUDIT_LIMIT))),
        _ => Request::Usage,
    }
}

fn format_date(at: OffsetDateTime) -> String {
    at.format(DATE_FORMAT).unwrap_or_else(|_| at.date().to_string())
}

/// The command manager: every custom command plus how to change them.
#[must_use]
pub fn render_list(commands: &[CustomCommand]) -> String {
    let mut out = format!("📝 Custom Commands ({})\n", commands.len());
    if commands.is_empty() {
        out.push_str("No custom commands yet.\n");
    }
    for cmd in commands {
        let _ = writeln!(
            out,
            "• \"{}\" → \"{}\" (by {} on {})",
            cmd.trigger,
            truncate(&cmd.response, 120),
            cmd.created_by,
            format_date(cmd.created_at)
        );
    }
    out.push_str("➕ Add: !custom add <trigger> = <response>\n");
    out.push_str("🗑️ Delete: !custom delete <trigger>\n");
    out.push_str("Use $what in a response to capture the text after the trigger.");
    out
}

fn render_audit(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No custom command changes yet.".to_owned();
    }
    let mut out = format!("Recent custom command changes ({}):", records.len());
    for record in records {
        let _ = write!(
            out,
            "\n- {} {} \"{}\" by {}",
            format_date(record.timestamp),
            record.action.as_str(),
            record.trigger,
            record.user_id
        );
    }
    out
}

/// Carries out one `!custom` request on behalf of `actor` and returns the
/// reply. Store failures become a user-facing message.
pub fn handle(store: &dyn CommandStore, actor: &str, args: &str) -> String {
    match parse_request(args) {
        Request::List => match store.list_all() {
            Ok(commands) => render_list(&commands),
            Err(e) => {
                warn!(error = %e, "Listing custom commands failed");
                UNAVAILABLE.to_owned()
            }
        },
        Request::Add { trigger, response } => match store.upsert(trigger, response, actor) {
            Ok(AuditAction::Update) => {
                format!("✅ Updated command \"{}\" → \"{response}\"", trigger.to_lowercase())
            }
            Ok(AuditAction::Create) => {
                format!("✅ Created command \"{}\" → \"{response}\"", trigger.to_lowercase())
            }
            Ok(AuditAction::Delete) => {
                warn!(trigger, "Store reported a delete for an upsert");
                format!("❌ Failed to create command \"{trigger}\".")
            }
            Err(e @ (StoreError::InvalidTrigger(_) | StoreError::InvalidResponse(_))) => {
                format!("❌ Couldn't save \"{trigger}\": {e}")
            }
            Err(e) => {
                warn!(error = %e, trigger, "Saving custom command failed");
                format!("❌ Failed to create command \"{trigger}\".")
            }
        },
        Request::Delete(trigger) => match store.delete(trigger, actor) {
            Ok(_) => format!("✅ Deleted command \"{trigger}\""),
            Err(StoreError::NotFound(_)) => format!("❌ There's no command \"{trigger}\" to delete."),
            Err(e) => {
                warn!(error = %e, trigger, "Deleting custom command failed");
                format!("❌ Failed to delete command \"{trigger}\".")
            }
        },
        Request::Audit(limit) => match store.audit_log(limit) {
            Ok(records) => render_audit(&records),
            Err(e) => {
                warn!(error = %e, "Reading audit log failed");
                UNAVAILABLE.to_owned()
            }
        },
        Request::Usage => USAGE.to_owned(),
    }
}

#[async_trait]
impl Plugin for CustomCommands {
    fn id(&self) -> &'static str {
        "custom"
    }

    fn help(&self) -> &'static str {
        "Manage custom commands: !custom [list|add <trigger> = <response>|delete <trigger>|audit]"
    }

    fn spec(&self) -> PluginSpec {
        PluginSpec::new("custom", &["!custom"])
    }

    async fn run(&self, ctx: &PluginContext, args: &str, _spec: &PluginSpec) -> Result<()> {
        let reply = handle(ctx.store.as_ref(), ctx.sender.as_str(), args);
        send_text(ctx, reply).await
    }
}

#[cfg(test)]
mod tests {
    use command_store::JsonStore;

    use super::*;

    #[test]
    fn parses_requests() {
        assert_eq!(parse_request(""), Request::List);
        assert_eq!(parse_request("LIST"), Request::List);
        assert_eq!(
            parse_request("add Love Letter = Dear $what,"),
            Request::Add {
                trigger: "Love Letter",
                response: "Dear $what,"
            }
        );
        assert_eq!(parse_request("add = nope"), Request::Usage);
        assert_eq!(parse_request("add no equals"), Request::Usage);
        assert_eq!(parse_request("delete panic"), Request::Delete("panic"));
        assert_eq!(parse_request("delete"), Request::Usage);
        assert_eq!(parse_request("audit"), Request::Audit(DEFAULT_AUDIT_LIMIT));
        assert_eq!(parse_request("audit 500"), Request::Audit(MAX_AUDIT_LIMIT));
        assert_eq!(parse_request("audit lots"), Request::Usage);
        assert_eq!(parse_request("juggle"), Request::Usage);
    }

    #[test]
    fn add_update_delete_flow() {
        let store = JsonStore::in_memory();
        let created = handle(&store, "@tanya:example.org", "add PANIC = take a breath");
        assert_eq!(created, "✅ Created command \"panic\" → \"take a breath\"");
        let updated = handle(&store, "@sam:example.org", "add panic = breathe");
        assert_eq!(updated, "✅ Updated command \"panic\" → \"breathe\"");

        let listing = handle(&store, "@sam:example.org", "list");
        assert!(listing.starts_with("📝 Custom Commands (1)"), "{listing}");
        assert!(listing.contains("\"panic\" → \"breathe\" (by @tanya:example.org on "));

        assert_eq!(
            handle(&store, "@sam:example.org", "delete panic"),
            "✅ Deleted command \"panic\""
        );
        assert_eq!(
            handle(&store, "@sam:example.org", "delete panic"),
            "❌ There's no command \"panic\" to delete."
        );

        let audit = handle(&store, "@sam:example.org", "audit");
        assert!(audit.starts_with("Recent custom command changes (3):"), "{audit}");
        let delete_pos = audit.find("delete \"panic\"").unwrap();
        let create_pos = audit.find("create \"panic\"").unwrap();
        assert!(delete_pos < create_pos);
    }

    #[test]
    fn validation_failures_are_reported() {
        let store = JsonStore::in_memory();
        let reply = handle(&store, "@tanya:example.org", "add x = too short");
        assert!(reply.starts_with("❌ Couldn't save \"x\": trigger must be 2-100"), "{reply}");
        let reply = handle(&store, "@tanya:example.org", "add panic =");
        assert!(reply.starts_with("❌ Couldn't save \"panic\": response"), "{reply}");
        assert!(store.list_all().unwrap().is_empty());
    }

    /// Upserts report whatever action it was built with.
    struct Reporting(AuditAction);

    impl CommandStore for Reporting {
        fn lookup(&self, _: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn list_all(&self) -> Result<Vec<CustomCommand>, StoreError> {
            Ok(Vec::new())
        }
        fn upsert(&self, _: &str, _: &str, _: &str) -> Result<AuditAction, StoreError> {
            Ok(self.0)
        }
        fn delete(&self, trigger: &str, _: &str) -> Result<String, StoreError> {
            Err(StoreError::NotFound(trigger.to_owned()))
        }
        fn creator(&self, _: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn audit_log(&self, _: usize) -> Result<Vec<AuditRecord>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn add_reports_the_store_outcome() {
        let actor = "@tanya:example.org";
        assert_eq!(
            handle(&Reporting(AuditAction::Create), actor, "add panic = breathe"),
            "✅ Created command \"panic\" → \"breathe\""
        );
        assert_eq!(
            handle(&Reporting(AuditAction::Update), actor, "add panic = breathe"),
            "✅ Updated command \"panic\" → \"breathe\""
        );
        assert_eq!(
            handle(&Reporting(AuditAction::Delete), actor, "add panic = breathe"),
            "❌ Failed to create command \"panic\"."
        );
    }

    #[test]
    fn empty_listing_still_explains_usage() {
        let listing = render_list(&[]);
        assert!(listing.contains("No custom commands yet."));
        assert!(listing.contains("!custom add <trigger> = <response>"));
    }

    #[test]
    fn dates_are_short() {
        let at = time::macros::datetime!(2026-10-19 12:00 UTC);
        assert_eq!(format_date(at), "Oct 19, 2026");
    }
}
