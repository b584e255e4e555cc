//! Remote issue → [`IssueRecord`] mapping.
//!
//! Pure functions; no I/O.

use crate::jira::{CommentPage, FixVersion, JiraTime, Named, RemoteIssue};
use crate::markup::jira_to_markdown;
use crate::models::IssueRecord;

/// Separator line written before the first comment and after each one.
const RULE: &str = "---\n";

/// Flatten one remote issue into a store row.
///
/// Comments authored by `automation_author` (exact display-name match) are
/// left out.
pub fn to_record(issue: &RemoteIssue, automation_author: &str) -> IssueRecord {
    let fields = &issue.fields;
    let creator = fields.creator.clone().unwrap_or_default();
    let assignee = fields.assignee.clone().unwrap_or_default();

    IssueRecord {
        key: issue.key.clone(),
        summary: fields.summary.clone(),
        description: fields.description.clone().unwrap_or_default(),
        creator_email: creator.email_address,
        creator_name: creator.display_name,
        assignee_email: assignee.email_address,
        assignee_name: assignee.display_name,
        comments: flatten_comments(fields.comment.as_ref(), automation_author),
        created: encode_time(fields.created.as_ref()),
        updated: encode_time(fields.updated.as_ref()),
        fix_version: join_fix_versions(&fields.fix_versions),
        issue_type: name_of(fields.issue_type.as_ref()),
        priority: name_of(fields.priority.as_ref()),
        status: name_of(fields.status.as_ref()),
    }
}

/// Render comments in reverse retrieval order, each under an author and
/// created header, separated by rule lines.
///
/// Returns an empty string when there is nothing to show.
pub fn flatten_comments(page: Option<&CommentPage>, automation_author: &str) -> String {
    let Some(page) = page else {
        return String::new();
    };

    let mut res = String::from(RULE);
    let mut kept = 0usize;
    for comment in page.comments.iter().rev() {
        if comment.author.display_name == automation_author {
            continue;
        }
        res.push_str(&format!("Author: {}\n", comment.author.display_name));
        res.push_str(&format!("Created: {}\n", comment.created));
        res.push_str(&jira_to_markdown(&comment.body));
        res.push('\n');
        res.push_str(RULE);
        kept += 1;
    }

    if kept == 0 {
        return String::new();
    }
    res
}

/// Version names joined with `", "`.
pub fn join_fix_versions(versions: &[FixVersion]) -> String {
    versions
        .iter()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn encode_time(t: Option<&JiraTime>) -> String {
    t.map(JiraTime::encode).unwrap_or_default()
}

fn name_of(n: Option<&Named>) -> String {
    n.map(|n| n.name.clone()).unwrap_or_default()
}
