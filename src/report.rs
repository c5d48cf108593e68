use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::aggregate;
use crate::models::{Faculty, StoredRecord};

/// Markdown digest of the derived views. With `scope` set to a faculty
/// member, only that member and their records are summarised.
pub fn build_report(
    generated_at: DateTime<Utc>,
    scope: Option<&Faculty>,
    faculty: &[Faculty],
    records: &[StoredRecord],
) -> String {
    let (faculty, records): (&[Faculty], Vec<StoredRecord>) = match scope {
        Some(member) => (
            std::slice::from_ref(member),
            records
                .iter()
                .filter(|record| record.faculty_id == member.id)
                .cloned()
                .collect(),
        ),
        None => (faculty, records.to_vec()),
    };

    let stats = aggregate::faculty_stats(faculty, &records);
    let board = aggregate::leaderboard(&records, aggregate::LEADERBOARD_SIZE);
    let departments = aggregate::department_performance(&records);
    let criteria = aggregate::criteria_distribution(&records);

    let mut output = String::new();
    let scope_label = scope
        .map(|member| format!("{} <{}>", member.full_name, member.email))
        .unwrap_or_else(|| "all faculty".to_string());

    let _ = writeln!(output, "# IQAC Activity Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope_label,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Faculty on record: {}", stats.total_faculty);
    let _ = writeln!(output, "- Faculty with records: {}", stats.faculty_with_records);
    let _ = writeln!(output, "- Activity records: {}", stats.total_records);
    match stats.avg_score_all {
        Some(avg) => {
            let _ = writeln!(output, "- Mean score: {avg:.2}");
        }
        None => {
            let _ = writeln!(output, "- Mean score: n/a");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");
    if board.is_empty() {
        let _ = writeln!(output, "No activity records yet.");
    } else {
        for (rank, entry) in board.iter().enumerate() {
            let _ = writeln!(
                output,
                "{}. {} ({}) avg {:.2} ({:.2}/10) across {} records",
                rank + 1,
                entry.faculty_name,
                entry.department,
                entry.avg_score,
                entry.score_out_of_10,
                entry.total_records
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Department Performance");
    if departments.is_empty() {
        let _ = writeln!(output, "No departments with records.");
    } else {
        for department in departments.iter() {
            let _ = writeln!(
                output,
                "- {}: {} faculty, avg {:.2}",
                department.department, department.faculty_count, department.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Criteria Distribution");
    if criteria.is_empty() {
        let _ = writeln!(output, "No records filed under any criterion.");
    } else {
        for share in criteria.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {} records, avg {:.2}",
                share.criteria_name, share.criteria_id, share.record_count, share.avg_score
            );
        }
    }

    let mut recent = records;
    aggregate::sort_newest_first(&mut recent);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Submissions");

    if recent.is_empty() {
        let _ = writeln!(output, "No activity records yet.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) on {}: {} [{}]",
                record.faculty_name,
                record.sub_criteria,
                record.period,
                record.created_at.format("%Y-%m-%d"),
                record.evidence,
                record.score
            );
        }
    }

    output
}
