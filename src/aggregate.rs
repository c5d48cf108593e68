use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::criteria::criteria_name;
use crate::models::{
    ActivityRecord, CriteriaShare, DepartmentPerformance, Faculty, FacultyStats, FacultySummary,
    LeaderboardEntry, StoredRecord,
};

pub const LEADERBOARD_SIZE: usize = 10;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(total: i64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(total as f64 / count as f64)
    }
}

pub fn faculty_records(records: &[StoredRecord], faculty_id: Uuid) -> Vec<ActivityRecord> {
    let mut owned: Vec<StoredRecord> = records
        .iter()
        .filter(|record| record.faculty_id == faculty_id)
        .cloned()
        .collect();
    sort_newest_first(&mut owned);
    owned.into_iter().map(ActivityRecord::from).collect()
}

pub fn sort_newest_first(records: &mut [StoredRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
}

/// Faculty ranked by mean record score, highest first. Faculty without
/// records never appear; equal means fall back to faculty id ascending.
pub fn leaderboard(records: &[StoredRecord], limit: usize) -> Vec<LeaderboardEntry> {
    struct Tally<'a> {
        name: &'a str,
        department: &'a str,
        total: i64,
        count: usize,
    }

    let mut tallies: HashMap<Uuid, Tally> = HashMap::new();
    for record in records {
        let entry = tallies.entry(record.faculty_id).or_insert_with(|| Tally {
            name: &record.faculty_name,
            department: &record.department,
            total: 0,
            count: 0,
        });
        entry.total += i64::from(record.score);
        entry.count += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = tallies
        .into_iter()
        .map(|(faculty_id, tally)| {
            let raw_mean = tally.total as f64 / tally.count as f64;
            LeaderboardEntry {
                faculty_id,
                faculty_name: tally.name.to_string(),
                department: tally.department.to_string(),
                total_records: tally.count,
                avg_score: round2(raw_mean),
                score_out_of_10: round2(raw_mean / 10.0),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.avg_score
            .partial_cmp(&a.avg_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.faculty_id.cmp(&b.faculty_id))
    });
    entries.truncate(limit);
    entries
}

/// Per-department faculty count and mean score, ordered by department name.
pub fn department_performance(records: &[StoredRecord]) -> Vec<DepartmentPerformance> {
    let mut map: BTreeMap<&str, (HashSet<Uuid>, i64, usize)> = BTreeMap::new();

    for record in records {
        let entry = map
            .entry(record.department.as_str())
            .or_insert_with(|| (HashSet::new(), 0, 0));
        entry.0.insert(record.faculty_id);
        entry.1 += i64::from(record.score);
        entry.2 += 1;
    }

    map.into_iter()
        .map(|(department, (faculty, total, count))| DepartmentPerformance {
            department: department.to_string(),
            faculty_count: faculty.len(),
            avg_score: mean(total, count),
        })
        .collect()
}

pub fn criteria_distribution(records: &[StoredRecord]) -> Vec<CriteriaShare> {
    let mut map: BTreeMap<i32, (usize, i64)> = BTreeMap::new();

    for record in records {
        let entry = map.entry(record.criteria_id).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += i64::from(record.score);
    }

    map.into_iter()
        .map(|(criteria_id, (count, total))| CriteriaShare {
            criteria_id,
            criteria_name: criteria_name(criteria_id),
            record_count: count,
            avg_score: mean(total, count),
        })
        .collect()
}

pub fn faculty_stats(faculty: &[Faculty], records: &[StoredRecord]) -> FacultyStats {
    let with_records: HashSet<Uuid> = records.iter().map(|record| record.faculty_id).collect();
    let total: i64 = records.iter().map(|record| i64::from(record.score)).sum();

    FacultyStats {
        total_faculty: faculty.len(),
        faculty_with_records: with_records.len(),
        total_records: records.len(),
        avg_score_all: (!records.is_empty()).then(|| mean(total, records.len())),
    }
}

pub fn faculty_summary(faculty: Faculty, records: &[StoredRecord]) -> FacultySummary {
    let owned = faculty_records(records, faculty.id);
    let total: i64 = owned.iter().map(|record| i64::from(record.score)).sum();
    let criteria_covered = owned
        .iter()
        .map(|record| record.criteria_id)
        .collect::<HashSet<_>>()
        .len();

    FacultySummary {
        total_records: owned.len(),
        avg_score: (!owned.is_empty()).then(|| mean(total, owned.len())),
        criteria_covered,
        records: owned,
        faculty,
    }
}
