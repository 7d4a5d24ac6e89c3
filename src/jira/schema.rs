//! Request and response bodies for the ticketing REST API, one type per payload.

use serde::{Deserialize, Serialize};

use crate::report::DeviceMetadata;

/// Longest note prefix used as the issue summary, in characters
pub const SUMMARY_MAX_CHARS: usize = 50;

const SUMMARY_ELLIPSIS: char = '…';
const EMPTY_NOTE_SUMMARY: &str = "Bug report from shake";
const EMPTY_NOTE_TEXT: &str = "(no note provided)";

/// `POST /rest/api/3/issue`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIssueRequest {
    pub fields: IssueFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    pub project: ProjectRef,
    pub issuetype: IssueTypeRef,
    pub summary: String,
    pub description: AdfDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTypeRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateIssueResponse {
    pub key: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// `GET /rest/api/3/project/{projectKey}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectResponse {
    pub id: String,
}

/// `GET /rest/api/3/issue/createmeta?projectIds={id}&expand=projects.issuetypes`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateMetaResponse {
    #[serde(default)]
    pub projects: Vec<CreateMetaProject>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateMetaProject {
    #[serde(default)]
    pub issuetypes: Vec<IssueTypeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTypeEntry {
    pub id: String,
    pub name: String,
}

/// Atlassian Document Format root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub content: Vec<AdfNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AdfNode {
    Heading {
        attrs: HeadingAttrs,
        content: Vec<AdfNode>,
    },
    Paragraph {
        content: Vec<AdfNode>,
    },
    BulletList {
        content: Vec<AdfNode>,
    },
    ListItem {
        content: Vec<AdfNode>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<AdfMark>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AdfMark {
    Strong,
}

impl AdfNode {
    pub fn text(text: impl Into<String>) -> Self {
        AdfNode::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn strong(text: impl Into<String>) -> Self {
        AdfNode::Text {
            text: text.into(),
            marks: vec![AdfMark::Strong],
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        AdfNode::Heading {
            attrs: HeadingAttrs { level },
            content: vec![AdfNode::text(text)],
        }
    }

    pub fn paragraph(content: Vec<AdfNode>) -> Self {
        AdfNode::Paragraph { content }
    }
}

impl AdfDocument {
    pub fn new(content: Vec<AdfNode>) -> Self {
        Self {
            kind: "doc".to_string(),
            version: 1,
            content,
        }
    }

    /// Heading, the user's note, then the device snapshot as a bullet list
    pub fn bug_report(note: &str, metadata: &DeviceMetadata) -> Self {
        let note = note.trim();
        let note_paragraphs: Vec<AdfNode> = if note.is_empty() {
            vec![AdfNode::paragraph(vec![AdfNode::text(EMPTY_NOTE_TEXT)])]
        } else {
            note.lines()
                .map(str::trim_end)
                .filter(|line| !line.is_empty())
                .map(|line| AdfNode::paragraph(vec![AdfNode::text(line)]))
                .collect()
        };

        let items = metadata
            .entries()
            .into_iter()
            .map(|(label, value)| AdfNode::ListItem {
                content: vec![AdfNode::paragraph(vec![
                    AdfNode::strong(format!("{label}: ")),
                    AdfNode::text(value),
                ])],
            })
            .collect();

        let mut content = vec![AdfNode::heading(2, "Bug Report"), AdfNode::heading(3, "User Note")];
        content.extend(note_paragraphs);
        content.push(AdfNode::heading(3, "Device Snapshot"));
        content.push(AdfNode::BulletList { content: items });
        Self::new(content)
    }
}

/// Single-line issue summary from the note, cut to [`SUMMARY_MAX_CHARS`]
pub fn summary_for(note: &str) -> String {
    // Each run of line breaks becomes a single space
    let line = note
        .trim()
        .split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if line.is_empty() {
        return EMPTY_NOTE_SUMMARY.to_string();
    }
    if line.chars().count() <= SUMMARY_MAX_CHARS {
        return line;
    }

    let mut truncated: String = line.chars().take(SUMMARY_MAX_CHARS).collect();
    truncated.push(SUMMARY_ELLIPSIS);
    truncated
}
