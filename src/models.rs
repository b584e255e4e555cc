//! The canonical issue record stored in the `jira` table.

use serde::Serialize;

/// One flattened issue, one row of the `jira` table.
///
/// Field order matches the table's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct IssueRecord {
    pub key: String,
    pub summary: String,
    pub description: String,
    #[sqlx(rename = "creatorEmail")]
    pub creator_email: String,
    #[sqlx(rename = "creatorName")]
    pub creator_name: String,
    #[sqlx(rename = "assigneeEmail")]
    pub assignee_email: String,
    #[sqlx(rename = "assigneeName")]
    pub assignee_name: String,
    pub comments: String,
    pub created: String,
    pub updated: String,
    #[sqlx(rename = "fixVersion")]
    pub fix_version: String,
    #[sqlx(rename = "issueType")]
    pub issue_type: String,
    pub priority: String,
    pub status: String,
}

impl IssueRecord {
    /// Detail text: the non-empty description, fix version and priority
    /// lines, then the flattened comments.
    pub fn render(&self) -> String {
        let mut res = String::new();
        if !self.description.is_empty() {
            res.push_str(&format!("Description: {}\n", self.description));
        }
        if !self.fix_version.is_empty() {
            res.push_str(&format!("Fix Version: {}\n", self.fix_version));
        }
        if !self.priority.is_empty() {
            res.push_str(&format!("Priority: {}\n", self.priority));
        }
        if !self.comments.is_empty() {
            res.push('\n');
            res.push_str(&self.comments);
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_skips_empty_fields() {
        let record = IssueRecord {
            key: "TI-1".to_string(),
            priority: "High".to_string(),
            ..Default::default()
        };
        assert_eq!(record.render(), "Priority: High\n");
    }

    #[test]
    fn test_render_full() {
        let record = IssueRecord {
            key: "TI-2".to_string(),
            description: "Boot loops".to_string(),
            fix_version: "1.0, 2.0".to_string(),
            priority: "Low".to_string(),
            comments: "---\nAuthor: Ann\n".to_string(),
            ..Default::default()
        };
        assert_eq!(
            record.render(),
            "Description: Boot loops\nFix Version: 1.0, 2.0\nPriority: Low\n\n---\nAuthor: Ann\n"
        );
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(IssueRecord::default().render(), "");
    }
}
