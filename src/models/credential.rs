//! 登录凭证记录
//!
//! 每行一条，分号分隔：
//! `name;value;domain;path;expiry;secure;http_only;same_site`

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};

const FIELD_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expiry: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<String>,
}

impl Credential {
    /// 解析一行记录，`line_no` 仅用于报错
    pub fn parse_line(line: &str, line_no: usize) -> Result<Self> {
        let parts: Vec<&str> = line.split(';').collect();
        if parts.len() < FIELD_COUNT {
            return Err(AppError::CredentialParse {
                line: line_no,
                reason: format!("需要 {} 个字段，实际 {} 个", FIELD_COUNT, parts.len()),
            });
        }

        let expiry = match parts[4].trim() {
            "" => None,
            raw => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map_err(|e| AppError::CredentialParse {
                        line: line_no,
                        reason: format!("过期时间无效 '{}': {}", raw, e),
                    })?
                    .with_timezone(&Utc),
            ),
        };

        Ok(Self {
            name: parts[0].to_string(),
            value: parts[1].to_string(),
            domain: parts[2].trim_start_matches('.').to_string(),
            path: parts[3].to_string(),
            expiry,
            secure: parse_flag(parts[5], line_no)?,
            http_only: parse_flag(parts[6], line_no)?,
            same_site: match parts[7].trim() {
                "" => None,
                other => Some(other.to_string()),
            },
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};{}",
            self.name,
            self.value,
            self.domain,
            self.path,
            self.expiry.map(|e| e.to_rfc3339()).unwrap_or_default(),
            self.secure,
            self.http_only,
            self.same_site.as_deref().unwrap_or_default()
        )
    }
}

/// 解析整个凭证文件，忽略空行
pub fn parse_records(content: &str) -> Result<Vec<Credential>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| Credential::parse_line(line, idx + 1))
        .collect()
}

pub fn format_records(credentials: &[Credential]) -> String {
    let mut out = String::new();
    for credential in credentials {
        out.push_str(&credential.to_line());
        out.push('\n');
    }
    out
}

fn parse_flag(raw: &str, line_no: usize) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" | "" => Ok(false),
        other => Err(AppError::CredentialParse {
            line: line_no,
            reason: format!("布尔值无效: {}", other),
        }),
    }
}
